//! Pitch-class (chroma) folding and the tonnetz projection

use std::f64::consts::PI;

pub const PITCH_CLASSES: usize = 12;
pub const TONNETZ_DIMS: usize = 6;

/// Bins below A0 carry no usable pitch information at STFT resolution
const MIN_PITCH_HZ: f64 = 27.5;

/// Pitch class of a frequency, C = 0 ... B = 11
pub fn pitch_class(freq: f64) -> usize {
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    (midi.round() as i64).rem_euclid(PITCH_CLASSES as i64) as usize
}

/// Precomputed bin -> pitch class assignment for one STFT geometry
#[derive(Debug, Clone)]
pub struct ChromaMap {
    classes: Vec<Option<usize>>,
}

impl ChromaMap {
    pub fn new(fft_size: usize, sample_rate: u32) -> Self {
        let resolution = sample_rate as f64 / fft_size as f64;
        let classes = (0..fft_size / 2 + 1)
            .map(|k| {
                let freq = k as f64 * resolution;
                (freq >= MIN_PITCH_HZ).then(|| pitch_class(freq))
            })
            .collect();
        Self { classes }
    }

    /// Chroma vector of one power spectrum, scaled so the strongest class is 1.0
    pub fn chroma(&self, power: &[f64]) -> [f64; PITCH_CLASSES] {
        let mut chroma = [0.0; PITCH_CLASSES];
        for (class, &p) in self.classes.iter().zip(power) {
            if let Some(c) = class {
                chroma[*c] += p;
            }
        }

        let max = chroma.iter().copied().fold(0.0f64, f64::max);
        if max > 0.0 {
            for value in chroma.iter_mut() {
                *value /= max;
            }
        }
        chroma
    }
}

/// Project chroma onto the 6-D tonal centroid space
///
/// Rows pair sine/cosine coordinates on the circles of fifths, minor thirds
/// and major thirds. The chroma is L1-normalized first; an all-zero chroma
/// maps to the origin.
pub fn tonnetz(chroma: &[f64; PITCH_CLASSES]) -> [f64; TONNETZ_DIMS] {
    let total: f64 = chroma.iter().map(|c| c.abs()).sum();
    let mut out = [0.0; TONNETZ_DIMS];
    if total <= 0.0 {
        return out;
    }

    for (l, &c) in chroma.iter().enumerate() {
        let weight = c / total;
        let l = l as f64;
        let fifths = l * 7.0 * PI / 6.0;
        let minor = l * 3.0 * PI / 2.0;
        let major = l * 2.0 * PI / 3.0;

        out[0] += weight * fifths.sin();
        out[1] += weight * fifths.cos();
        out[2] += weight * minor.sin();
        out[3] += weight * minor.cos();
        out[4] += weight * 0.5 * major.sin();
        out[5] += weight * 0.5 * major.cos();
    }
    out
}
