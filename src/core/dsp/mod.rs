//! Digital Signal Processing utilities

mod stats;
mod windows;

pub use stats::{
    amplitude_to_db, mean, mean_variance, peak_amplitude, power_to_db, rms, spectral_centroid,
    spectral_contrast, spectral_rolloff, trim_range, variance, zero_crossing_rate,
};
pub use windows::{create_window, WindowType};

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Short-time spectral analyzer over fixed frames
///
/// The FFT plan is built once, so the analyzer is immutable and `Sync`.
pub struct SpectralAnalyzer {
    fft_size: usize,
    hop_size: usize,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectralAnalyzer {
    pub fn new(fft_size: usize, hop_size: usize, window_type: WindowType) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft_size,
            hop_size,
            window: create_window(fft_size, window_type),
            fft: planner.plan_fft_forward(fft_size),
        }
    }

    /// Number of full frames that fit in `len` samples (no padding)
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.fft_size {
            0
        } else {
            (len - self.fft_size) / self.hop_size + 1
        }
    }

    /// Iterate over the full analysis frames of a signal
    pub fn frames<'a>(&self, samples: &'a [f64]) -> impl Iterator<Item = &'a [f64]> + 'a {
        let fft_size = self.fft_size;
        let hop_size = self.hop_size;
        (0..self.frame_count(samples.len())).map(move |i| {
            let start = i * hop_size;
            &samples[start..start + fft_size]
        })
    }

    /// Compute magnitude spectrum for a frame (`fft_size / 2 + 1` bins)
    pub fn compute_spectrum(&self, samples: &[f64]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .take(self.fft_size)
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        // Pad if necessary
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer[..self.num_bins()].iter().map(|c| c.norm()).collect()
    }

    /// Magnitude spectrogram of the whole signal, one row per frame
    pub fn compute_spectrogram(&self, samples: &[f64]) -> Vec<Vec<f64>> {
        self.frames(samples)
            .map(|frame| self.compute_spectrum(frame))
            .collect()
    }

    /// Centre frequency of every spectrum bin
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f64> {
        let resolution = sample_rate as f64 / self.fft_size as f64;
        (0..self.num_bins()).map(|k| k as f64 * resolution).collect()
    }

    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_spectral_analyzer() {
        let analyzer = SpectralAnalyzer::new(1024, 512, WindowType::Hann);
        let samples: Vec<f64> = (0..1024)
            .map(|i| (2.0 * PI * 440.0 * i as f64 / 44100.0).sin())
            .collect();

        let spectrum = analyzer.compute_spectrum(&samples);
        assert_eq!(spectrum.len(), 513); // fft_size/2 + 1
    }

    #[test]
    fn test_frame_count() {
        let analyzer = SpectralAnalyzer::new(2048, 512, WindowType::Hann);
        assert_eq!(analyzer.frame_count(2047), 0);
        assert_eq!(analyzer.frame_count(2048), 1);
        assert_eq!(analyzer.frame_count(2048 + 511), 1);
        assert_eq!(analyzer.frame_count(2048 + 512), 2);
        assert_eq!(analyzer.frames(&vec![0.0; 4096]).count(), 5);
    }

    #[test]
    fn test_bin_centered_tone_peaks_at_its_bin() {
        let analyzer = SpectralAnalyzer::new(2048, 512, WindowType::Hann);
        let samples: Vec<f64> = (0..2048)
            .map(|i| (2.0 * PI * 40.0 * i as f64 / 2048.0).sin())
            .collect();

        let spectrum = analyzer.compute_spectrum(&samples);
        let peak_bin = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 40);

        let freqs = analyzer.bin_frequencies(22050);
        assert!((freqs[40] - 430.664).abs() < 0.01);
    }
}
