// src/core/analysis/mfcc.rs
//
// Mel-frequency cepstral coefficients: triangular mel filterbank over the
// power spectrum, log compression with a clip-wide dynamic-range floor, then
// an orthonormal DCT-II.

use std::f64::consts::PI;

use crate::core::dsp::power_to_db;

/// Smallest power fed to the log
const AMIN: f64 = 1e-10;

pub fn hz_to_mel(freq: f64) -> f64 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// One triangular filter, stored from its first non-zero bin
#[derive(Debug, Clone)]
struct MelFilter {
    start_bin: usize,
    weights: Vec<f64>,
}

/// Area-normalized triangular mel filterbank spanning 0 Hz to Nyquist
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<MelFilter>,
}

impl MelFilterbank {
    pub fn new(n_mels: usize, fft_size: usize, sample_rate: u32) -> Self {
        let num_bins = fft_size / 2 + 1;
        let resolution = sample_rate as f64 / fft_size as f64;
        let max_mel = hz_to_mel(sample_rate as f64 / 2.0);

        let edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(max_mel * i as f64 / (n_mels + 1) as f64))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                let norm = 2.0 / (hi - lo);

                let weights: Vec<(usize, f64)> = (0..num_bins)
                    .filter_map(|k| {
                        let freq = k as f64 * resolution;
                        let rising = (freq - lo) / (center - lo);
                        let falling = (hi - freq) / (hi - center);
                        let w = rising.min(falling);
                        (w > 0.0).then_some((k, w * norm))
                    })
                    .collect();

                match weights.first() {
                    Some(&(start_bin, _)) => MelFilter {
                        start_bin,
                        weights: weights.into_iter().map(|(_, w)| w).collect(),
                    },
                    None => MelFilter {
                        start_bin: 0,
                        weights: Vec::new(),
                    },
                }
            })
            .collect();

        Self { filters }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Mel-band energies of one power spectrum
    pub fn apply(&self, power: &[f64]) -> Vec<f64> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .weights
                    .iter()
                    .zip(power.iter().skip(filter.start_bin))
                    .map(|(w, p)| w * p)
                    .sum()
            })
            .collect()
    }
}

/// Orthonormal DCT-II keeping the first `n_out` coefficients
#[derive(Debug, Clone)]
pub struct Dct {
    basis: Vec<Vec<f64>>,
}

impl Dct {
    pub fn new(n_in: usize, n_out: usize) -> Self {
        let n = n_in as f64;
        let basis = (0..n_out)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_in)
                    .map(|m| scale * (PI * k as f64 * (2 * m + 1) as f64 / (2.0 * n)).cos())
                    .collect()
            })
            .collect();
        Self { basis }
    }

    pub fn transform(&self, input: &[f64]) -> Vec<f64> {
        self.basis
            .iter()
            .map(|row| row.iter().zip(input).map(|(b, x)| b * x).sum())
            .collect()
    }
}

/// MFCC computation over a whole magnitude spectrogram
#[derive(Debug, Clone)]
pub struct MfccExtractor {
    filterbank: MelFilterbank,
    dct: Dct,
    top_db: f64,
}

impl MfccExtractor {
    pub fn new(n_mfcc: usize, n_mels: usize, fft_size: usize, sample_rate: u32, top_db: f64) -> Self {
        Self {
            filterbank: MelFilterbank::new(n_mels, fft_size, sample_rate),
            dct: Dct::new(n_mels, n_mfcc),
            top_db,
        }
    }

    /// Coefficients for every frame of a magnitude spectrogram
    ///
    /// Log-mel values are floored at `top_db` below the loudest band of the
    /// whole clip before the DCT.
    pub fn compute(&self, spectrogram: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let log_mel: Vec<Vec<f64>> = spectrogram
            .iter()
            .map(|mags| {
                let power: Vec<f64> = mags.iter().map(|m| m * m).collect();
                self.filterbank
                    .apply(&power)
                    .into_iter()
                    .map(|e| power_to_db(e, AMIN))
                    .collect()
            })
            .collect();

        let max_db = log_mel
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let floor = max_db - self.top_db;

        log_mel
            .into_iter()
            .map(|frame| {
                let clamped: Vec<f64> = frame.into_iter().map(|db| db.max(floor)).collect();
                self.dct.transform(&clamped)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_round_trip() {
        for freq in [0.0, 100.0, 1000.0, 8000.0] {
            assert!((mel_to_hz(hz_to_mel(freq)) - freq).abs() < 1e-6);
        }
        assert!((hz_to_mel(1000.0) - 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_every_filter_covers_some_bins() {
        let bank = MelFilterbank::new(40, 2048, 22050);
        assert_eq!(bank.n_mels(), 40);
        for filter in &bank.filters {
            assert!(!filter.weights.is_empty());
        }
    }

    #[test]
    fn test_filterbank_localizes_energy() {
        let bank = MelFilterbank::new(40, 2048, 22050);
        let mut power = vec![0.0; 1025];
        power[40] = 1.0; // ~431 Hz
        let bands = bank.apply(&power);
        let active: Vec<usize> = (0..40).filter(|&m| bands[m] > 0.0).collect();
        assert!(!active.is_empty() && active.len() <= 2);
        assert!(active[0] < 20);
    }

    #[test]
    fn test_dct_is_orthonormal() {
        let dct = Dct::new(8, 8);
        for a in 0..8 {
            for b in 0..8 {
                let dot: f64 = dct.basis[a].iter().zip(&dct.basis[b]).map(|(x, y)| x * y).sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_identical_frames_give_identical_coefficients() {
        let extractor = MfccExtractor::new(13, 40, 2048, 22050, 80.0);
        let frame: Vec<f64> = (0..1025).map(|k| 1.0 / (1.0 + k as f64)).collect();
        let coeffs = extractor.compute(&[frame.clone(), frame.clone(), frame]);
        assert_eq!(coeffs.len(), 3);
        assert_eq!(coeffs[0].len(), 13);
        assert_eq!(coeffs[0], coeffs[1]);
        assert_eq!(coeffs[1], coeffs[2]);
    }
}
