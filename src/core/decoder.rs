// src/core/decoder.rs
//
// Audio decoding: base64 payload -> container bytes -> mono waveform at the
// analysis sample rate. Uses Symphonia for format-agnostic decoding and
// rubato for sample-rate conversion. This is the only module that touches a
// codec library.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::debug;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction as SincWindow,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use std::io::Cursor;

use crate::config::AnalysisParams;
use crate::error::DecodeError;

const RESAMPLE_CHUNK: usize = 1024;

/// Mono waveform with its sample rate
///
/// Never empty and never at 0 Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, DecodeError> {
        if samples.is_empty() {
            return Err(DecodeError::EmptyWaveform);
        }
        if sample_rate == 0 {
            return Err(DecodeError::MissingSampleRate);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decoded clip plus what the container said about it
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono waveform at the analysis rate
    pub waveform: Waveform,
    pub source_sample_rate: u32,
    pub source_channels: usize,
    pub codec_name: String,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.waveform.duration_secs()
    }
}

/// Interleaved PCM straight out of the codec
struct RawAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
    codec_name: String,
}

/// Decode base64 text into container bytes
///
/// Whitespace anywhere in the text and a leading `data:...;base64,` prefix
/// are ignored.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = payload.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, b)| b).unwrap_or(rest),
        None => trimmed,
    };

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    Ok(BASE64.decode(compact.as_bytes())?)
}

/// Decode a base64 audio payload into a mono waveform at the analysis rate
pub fn decode_payload(payload: &str, params: &AnalysisParams) -> Result<DecodedAudio, DecodeError> {
    let bytes = decode_base64(payload)?;
    decode_bytes(bytes, params)
}

/// Decode container bytes into a mono waveform at the analysis rate
pub fn decode_bytes(bytes: Vec<u8>, params: &AnalysisParams) -> Result<DecodedAudio, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let raw = demux(bytes, DurationLimit::new(params.max_duration_secs))?;
    let frames = raw.samples.len() / raw.channels;
    let duration_secs = frames as f64 / raw.sample_rate as f64;

    let mono = downmix(&raw.samples, raw.channels);
    let target = params.target_sample_rate;
    let samples = if raw.sample_rate == target {
        mono
    } else {
        debug!("Resampling {} Hz -> {} Hz", raw.sample_rate, target);
        resample(&mono, raw.sample_rate, target)?
    };

    debug!(
        "Decoded {} ({} ch, {} Hz, {:.2}s) into {} mono samples",
        raw.codec_name,
        raw.channels,
        raw.sample_rate,
        duration_secs,
        samples.len()
    );

    Ok(DecodedAudio {
        waveform: Waveform::new(samples, target)?,
        source_sample_rate: raw.sample_rate,
        source_channels: raw.channels,
        codec_name: raw.codec_name,
    })
}

/// Maximum clip length, checked while packets are still being decoded
#[derive(Debug, Clone, Copy)]
struct DurationLimit {
    limit_secs: Option<f64>,
}

impl DurationLimit {
    fn new(limit_secs: Option<f64>) -> Self {
        Self { limit_secs }
    }

    fn check(&self, frames: u64, sample_rate: u32) -> Result<(), DecodeError> {
        let Some(limit_secs) = self.limit_secs else {
            return Ok(());
        };
        if sample_rate == 0 {
            return Ok(());
        }

        let duration_secs = frames as f64 / sample_rate as f64;
        if duration_secs > limit_secs {
            return Err(DecodeError::TooLong {
                duration_secs,
                limit_secs,
            });
        }
        Ok(())
    }
}

fn demux(bytes: Vec<u8>, limit: DurationLimit) -> Result<RawAudio, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let meta_opts = MetadataOptions::default();
    // Drops encoder delay and padding when the stream declares them
    let fmt_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };

    let mut probed = symphonia::default::get_probe().format(&Hint::new(), mss, &fmt_opts, &meta_opts)?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let declared_rate = track.codec_params.sample_rate;
    let codec_name = symphonia::default::get_codecs()
        .get_codec(track.codec_params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| format!("{:?}", track.codec_params.codec));

    if let (Some(n_frames), Some(rate)) = (track.codec_params.n_frames, declared_rate) {
        limit.check(n_frames, rate)?;
    }

    let dec_opts = DecoderOptions::default();
    let mut decoder = symphonia::default::get_codecs().make(&track.codec_params, &dec_opts)?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut stream_rate = None;
    let mut channels = 0usize;

    loop {
        let packet = match probed.format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(symphonia::core::errors::Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(buf) => buf,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            stream_rate = Some(spec.rate);
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }

        if let Some(rate) = declared_rate.or(stream_rate) {
            let frames = samples.len() / channels.max(1);
            limit.check(frames as u64, rate)?;
        }
    }

    if samples.is_empty() || channels == 0 {
        return Err(DecodeError::EmptyWaveform);
    }

    let sample_rate = declared_rate
        .or(stream_rate)
        .filter(|&rate| rate > 0)
        .ok_or(DecodeError::MissingSampleRate)?;

    Ok(RawAudio {
        samples,
        sample_rate,
        channels,
        codec_name,
    })
}

/// Average interleaved channels down to mono
pub fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Band-limited sinc resampling of a mono signal
pub fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, DecodeError> {
    let fail = |reason: String| DecodeError::Resample { from, to, reason };

    if from == to {
        return Ok(samples.to_vec());
    }
    if from == 0 || to == 0 {
        return Err(fail("sample rates must be positive".to_string()));
    }

    let ratio = to as f64 / from as f64;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: SincWindow::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| fail(e.to_string()))?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK);

    let mut chunks = samples.chunks_exact(RESAMPLE_CHUNK);
    for chunk in &mut chunks {
        let wave_in: [&[f32]; 1] = [chunk];
        let out = resampler
            .process(&wave_in[..], None)
            .map_err(|e| fail(e.to_string()))?;
        output.extend_from_slice(&out[0]);
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let wave_in: [&[f32]; 1] = [remainder];
        let out = resampler
            .process_partial(Some(&wave_in[..]), None)
            .map_err(|e| fail(e.to_string()))?;
        output.extend_from_slice(&out[0]);
    }

    // Flush the filter delay
    while output.len() < expected + delay {
        let out = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| fail(e.to_string()))?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    Ok(output.into_iter().skip(delay).take(expected).collect())
}
