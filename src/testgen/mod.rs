// src/testgen/mod.rs
//
// Synthetic reference clip generation.
// Produces deterministic signals with known temporal behaviour so the
// detector can be exercised without fixture files:
//   - tone:    one hop-periodic sine, every analysis frame identical
//   - varied:  concatenated segments of differing pitch and loudness
//   - silence: all-zero samples

use std::io::Cursor;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hound::{SampleFormat, WavSpec, WavWriter};

/// (cycles per hop, amplitude) of each segment of the varied signal
pub const VARIED_SEGMENTS: [(usize, f32); 4] = [(5, 0.1), (30, 0.8), (12, 0.3), (110, 0.6)];

/// Kind of synthetic clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Tone,
    Varied,
    Silence,
}

impl SignalKind {
    pub fn all() -> Vec<Self> {
        vec![Self::Tone, Self::Varied, Self::Silence]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::Tone => "tone",
            SignalKind::Varied => "varied",
            SignalKind::Silence => "silence",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SignalKind::Tone => "Constant-amplitude periodic sine (machine-like)",
            SignalKind::Varied => "Segments of changing pitch and loudness (natural-like)",
            SignalKind::Silence => "Digital silence (rejected by the detector)",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "tone" | "sine" => Some(Self::Tone),
            "varied" | "segments" => Some(Self::Varied),
            "silence" | "silent" => Some(Self::Silence),
            _ => None,
        }
    }
}

/// Sine with exactly `cycles_per_hop` periods per `hop` samples, tiled
///
/// One hop-long cycle is computed once and repeated, so every frame that
/// starts on a hop boundary sees bit-identical samples.
pub fn periodic_tone(
    sample_rate: u32,
    hop: usize,
    cycles_per_hop: usize,
    amplitude: f32,
    duration_secs: f32,
) -> Vec<f32> {
    let len = (duration_secs * sample_rate as f32) as usize;
    if hop == 0 {
        return vec![0.0; len];
    }

    let cycle: Vec<f32> = (0..hop)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * cycles_per_hop as f64 * n as f64 / hop as f64;
            amplitude * phase.sin() as f32
        })
        .collect();

    cycle.iter().copied().cycle().take(len).collect()
}

/// Concatenated periodic tones, one per `(cycles_per_hop, amplitude)` pair
pub fn varied_segments(
    sample_rate: u32,
    hop: usize,
    segments: &[(usize, f32)],
    segment_secs: f32,
) -> Vec<f32> {
    segments
        .iter()
        .flat_map(|&(cycles, amplitude)| {
            periodic_tone(sample_rate, hop, cycles, amplitude, segment_secs)
        })
        .collect()
}

pub fn silence(sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    vec![0.0; (duration_secs * sample_rate as f32) as usize]
}

/// Mono samples for a signal kind; `varied` spreads the duration over its segments
pub fn generate(kind: SignalKind, sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    const HOP: usize = 512;
    match kind {
        SignalKind::Tone => periodic_tone(sample_rate, HOP, 10, 0.5, duration_secs),
        SignalKind::Varied => varied_segments(
            sample_rate,
            HOP,
            &VARIED_SEGMENTS,
            duration_secs / VARIED_SEGMENTS.len() as f32,
        ),
        SignalKind::Silence => silence(sample_rate, duration_secs),
    }
}

/// Repeat every mono sample across `channels` interleaved channels
pub fn interleave(mono: &[f32], channels: u16) -> Vec<f32> {
    mono.iter()
        .flat_map(|&s| std::iter::repeat(s).take(channels as usize))
        .collect()
}

/// Encode interleaved samples as a 16-bit PCM WAV file in memory
pub fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    if channels == 0 {
        bail!("channel count must be at least 1");
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).context("Failed to start WAV stream")?;
        for &sample in samples {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize().context("Failed to finalize WAV stream")?;
    }
    Ok(cursor.into_inner())
}

/// Write interleaved samples to a 16-bit PCM WAV file
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let bytes = wav_bytes(samples, sample_rate, channels)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Base64 text of a container, as sent to the detector
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
