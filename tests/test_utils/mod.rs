#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::io::Write;
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};
use uuid::Uuid;

use voicecheckr::testgen::{self, SignalKind, VARIED_SEGMENTS};

pub const RATE: u32 = 22050;
pub const HOP: usize = 512;

pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_voicecheckr"))
}

pub fn run_voicecheckr<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    Command::new(get_binary_path())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute voicecheckr")
}

/// Run with `input` piped to stdin
pub fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(get_binary_path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn voicecheckr");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for voicecheckr")
}

/// Fresh scratch directory under the system temp dir
pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("voicecheckr-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

/// Hop-periodic 430 Hz tone at constant amplitude
pub fn steady_tone(secs: f32) -> Vec<f32> {
    testgen::periodic_tone(RATE, HOP, 10, 0.5, secs)
}

/// Four one-second segments of changing pitch and loudness
pub fn varied_voice() -> Vec<f32> {
    testgen::varied_segments(RATE, HOP, &VARIED_SEGMENTS, 1.0)
}

pub fn wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    testgen::wav_bytes(&testgen::interleave(samples, channels), sample_rate, channels)
        .expect("Failed to encode WAV")
}

/// Mono MP3 through LAME, without a Xing/LAME info frame
pub fn mp3(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let mut builder = Builder::new().expect("Failed to create LAME builder");
    builder.set_num_channels(1).expect("set channels");
    builder.set_sample_rate(sample_rate).expect("set sample rate");
    builder.set_brate(Bitrate::Kbps128).expect("set bitrate");
    builder.set_quality(Quality::Best).expect("set quality");
    builder.set_to_write_vbr_tag(false).expect("disable info tag");
    let mut encoder = builder.build().expect("Failed to initialize LAME");

    let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(samples.len()));
    encoder
        .encode_to_vec(MonoPcm(samples), &mut out)
        .expect("Failed to encode MP3");
    out.reserve(7200);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut out)
        .expect("Failed to flush MP3");
    out
}

/// Plain (not hop-aligned) sine starting at phase zero
pub fn sine(freq: f32, amplitude: f32, secs: f32, sample_rate: u32) -> Vec<f32> {
    let len = (secs * sample_rate as f32) as usize;
    (0..len)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * freq as f64 * n as f64 / sample_rate as f64;
            amplitude * phase.sin() as f32
        })
        .collect()
}

pub fn base64_wav(samples: &[f32]) -> String {
    testgen::encode_base64(&wav(samples, RATE, 1))
}

pub fn base64_of(kind: SignalKind, secs: f32) -> String {
    base64_wav(&testgen::generate(kind, RATE, secs))
}
