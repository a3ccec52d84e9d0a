// src/core/analysis/features.rs
//
// Frame-level feature extraction and per-family summary statistics.
// Every family is computed over the same frame/hop segmentation and reduced
// to a per-dimension mean and variance, so the descriptor has a fixed shape
// regardless of clip duration.

use std::ops::Range;

use log::debug;
use serde::Serialize;

use super::chroma::{tonnetz, ChromaMap};
use super::mfcc::MfccExtractor;
use crate::config::{AnalysisParams, FeatureFamily};
use crate::core::decoder::Waveform;
use crate::core::dsp::{
    amplitude_to_db, mean_variance, peak_amplitude, rms, spectral_centroid, spectral_contrast,
    spectral_rolloff, trim_range, zero_crossing_rate, SpectralAnalyzer,
};
use crate::error::FeatureExtractionError;

/// Mean and variance of every dimension of one family across frames
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyStats {
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
}

impl FamilyStats {
    /// Summarize a scalar time series
    pub fn from_scalars(series: &[f64]) -> Self {
        let (mean, variance) = mean_variance(series);
        Self {
            mean: vec![mean],
            variance: vec![variance],
        }
    }

    /// Summarize a vector time series (one row per frame)
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let dims = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut mean = Vec::with_capacity(dims);
        let mut variance = Vec::with_capacity(dims);

        for d in 0..dims {
            let column: Vec<f64> = rows.iter().map(|r| r.as_ref()[d]).collect();
            let (m, v) = mean_variance(&column);
            mean.push(m);
            variance.push(v);
        }

        Self { mean, variance }
    }

    pub fn dimensions(&self) -> usize {
        self.mean.len()
    }

    /// Mean of the per-dimension variances; the value the scorer consumes
    pub fn variance_statistic(&self) -> f64 {
        if self.variance.is_empty() {
            return 0.0;
        }
        self.variance.iter().sum::<f64>() / self.variance.len() as f64
    }

    pub fn mean_statistic(&self) -> f64 {
        if self.mean.is_empty() {
            return 0.0;
        }
        self.mean.iter().sum::<f64>() / self.mean.len() as f64
    }

    pub fn is_finite(&self) -> bool {
        self.mean.iter().chain(&self.variance).all(|v| v.is_finite())
    }
}

/// Fixed-shape acoustic descriptor of one clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub mfcc: FamilyStats,
    pub spectral_centroid: FamilyStats,
    pub spectral_rolloff: FamilyStats,
    pub spectral_contrast: FamilyStats,
    pub zero_crossing_rate: FamilyStats,
    pub chroma: FamilyStats,
    pub rms_energy: FamilyStats,
    pub tonnetz: FamilyStats,
    pub frame_count: usize,
    pub duration_secs: f64,
}

impl FeatureVector {
    pub fn get(&self, family: FeatureFamily) -> &FamilyStats {
        match family {
            FeatureFamily::Mfcc => &self.mfcc,
            FeatureFamily::SpectralCentroid => &self.spectral_centroid,
            FeatureFamily::SpectralRolloff => &self.spectral_rolloff,
            FeatureFamily::SpectralContrast => &self.spectral_contrast,
            FeatureFamily::ZeroCrossingRate => &self.zero_crossing_rate,
            FeatureFamily::Chroma => &self.chroma,
            FeatureFamily::RmsEnergy => &self.rms_energy,
            FeatureFamily::Tonnetz => &self.tonnetz,
        }
    }

    pub fn get_mut(&mut self, family: FeatureFamily) -> &mut FamilyStats {
        match family {
            FeatureFamily::Mfcc => &mut self.mfcc,
            FeatureFamily::SpectralCentroid => &mut self.spectral_centroid,
            FeatureFamily::SpectralRolloff => &mut self.spectral_rolloff,
            FeatureFamily::SpectralContrast => &mut self.spectral_contrast,
            FeatureFamily::ZeroCrossingRate => &mut self.zero_crossing_rate,
            FeatureFamily::Chroma => &mut self.chroma,
            FeatureFamily::RmsEnergy => &mut self.rms_energy,
            FeatureFamily::Tonnetz => &mut self.tonnetz,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureFamily, &FamilyStats)> {
        FeatureFamily::all().into_iter().map(move |f| (f, self.get(f)))
    }

    /// First family holding a NaN or infinity, if any
    fn first_non_finite(&self) -> Option<FeatureFamily> {
        self.iter().find(|(_, stats)| !stats.is_finite()).map(|(f, _)| f)
    }
}

/// Extracts a `FeatureVector` from waveforms at one sample rate
pub struct FeatureExtractor {
    params: AnalysisParams,
    sample_rate: u32,
    analyzer: SpectralAnalyzer,
    frequencies: Vec<f64>,
    contrast_bands: Vec<Range<usize>>,
    mfcc: MfccExtractor,
    chroma: ChromaMap,
}

impl FeatureExtractor {
    pub fn new(params: &AnalysisParams, sample_rate: u32) -> Result<Self, FeatureExtractionError> {
        if sample_rate == 0 {
            return Err(FeatureExtractionError::InvalidSampleRate);
        }

        let analyzer = SpectralAnalyzer::new(params.frame_size, params.hop_size, params.window);
        let frequencies = analyzer.bin_frequencies(sample_rate);
        let contrast_bands = octave_bands(&frequencies, params.contrast_fmin, params.contrast_bands);

        Ok(Self {
            mfcc: MfccExtractor::new(
                params.n_mfcc,
                params.n_mels,
                params.frame_size,
                sample_rate,
                params.top_db,
            ),
            chroma: ChromaMap::new(params.frame_size, sample_rate),
            params: params.clone(),
            sample_rate,
            analyzer,
            frequencies,
            contrast_bands,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Extract features from a waveform recorded at this extractor's rate
    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureVector, FeatureExtractionError> {
        if waveform.sample_rate() != self.sample_rate {
            return FeatureExtractor::new(&self.params, waveform.sample_rate())?
                .extract_samples(waveform.samples());
        }
        self.extract_samples(waveform.samples())
    }

    pub fn extract_samples(&self, samples: &[f32]) -> Result<FeatureVector, FeatureExtractionError> {
        let frame_size = self.params.frame_size;
        if samples.len() < frame_size {
            return Err(FeatureExtractionError::TooShort {
                samples: samples.len(),
                frame_size,
            });
        }

        let mut signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();

        let peak_db = amplitude_to_db(peak_amplitude(&signal));
        if peak_db < self.params.min_peak_db {
            return Err(FeatureExtractionError::Silent { peak_db });
        }

        if let Some(trim_db) = self.params.trim_db {
            let kept = trim_range(&signal, trim_db);
            if kept.len() < signal.len() {
                debug!(
                    "Trimmed {} leading and {} trailing samples",
                    kept.start,
                    signal.len() - kept.end
                );
                signal.truncate(kept.end);
                signal.drain(..kept.start);
            }
            if signal.len() < frame_size {
                return Err(FeatureExtractionError::TooShort {
                    samples: signal.len(),
                    frame_size,
                });
            }
        }

        let spectrogram = self.analyzer.compute_spectrogram(&signal);
        let frame_count = spectrogram.len();

        let global_peak = spectrogram
            .iter()
            .flatten()
            .copied()
            .fold(0.0f64, f64::max);
        let contrast_floor = global_peak * 10f64.powf(-self.params.top_db / 20.0);

        let mut rms_series = Vec::with_capacity(frame_count);
        let mut zcr_series = Vec::with_capacity(frame_count);
        let mut centroid_series = Vec::with_capacity(frame_count);
        let mut rolloff_series = Vec::with_capacity(frame_count);
        let mut contrast_rows = Vec::with_capacity(frame_count);
        let mut chroma_rows = Vec::with_capacity(frame_count);
        let mut tonnetz_rows = Vec::with_capacity(frame_count);

        for (frame, mags) in self.analyzer.frames(&signal).zip(&spectrogram) {
            rms_series.push(rms(frame));
            zcr_series.push(zero_crossing_rate(frame));

            centroid_series.push(spectral_centroid(mags, &self.frequencies));
            rolloff_series.push(spectral_rolloff(
                mags,
                &self.frequencies,
                self.params.rolloff_percent,
            ));
            contrast_rows.push(spectral_contrast(
                mags,
                &self.contrast_bands,
                self.params.contrast_quantile,
                contrast_floor,
            ));

            let power: Vec<f64> = mags.iter().map(|m| m * m).collect();
            let chroma = self.chroma.chroma(&power);
            tonnetz_rows.push(tonnetz(&chroma));
            chroma_rows.push(chroma);
        }

        let mfcc_rows = self.mfcc.compute(&spectrogram);

        let features = FeatureVector {
            mfcc: FamilyStats::from_rows(&mfcc_rows),
            spectral_centroid: FamilyStats::from_scalars(&centroid_series),
            spectral_rolloff: FamilyStats::from_scalars(&rolloff_series),
            spectral_contrast: FamilyStats::from_rows(&contrast_rows),
            zero_crossing_rate: FamilyStats::from_scalars(&zcr_series),
            chroma: FamilyStats::from_rows(&chroma_rows),
            rms_energy: FamilyStats::from_scalars(&rms_series),
            tonnetz: FamilyStats::from_rows(&tonnetz_rows),
            frame_count,
            duration_secs: samples.len() as f64 / self.sample_rate as f64,
        };

        if let Some(family) = features.first_non_finite() {
            return Err(FeatureExtractionError::NonFinite { family });
        }

        debug!(
            "Extracted {} frames: mfcc var {:.3}, centroid var {:.1}, rms var {:.2e}",
            frame_count,
            features.mfcc.variance_statistic(),
            features.spectral_centroid.variance_statistic(),
            features.rms_energy.variance_statistic()
        );

        Ok(features)
    }
}

/// Extract features with a one-off extractor for the waveform's rate
pub fn extract_features(
    waveform: &Waveform,
    params: &AnalysisParams,
) -> Result<FeatureVector, FeatureExtractionError> {
    FeatureExtractor::new(params, waveform.sample_rate())?.extract_samples(waveform.samples())
}

/// Bin ranges of the contrast sub-bands
///
/// `[0, fmin)`, then octaves `[fmin * 2^k, fmin * 2^(k+1))`, with the last band
/// running up to Nyquist.
fn octave_bands(frequencies: &[f64], fmin: f64, n_bands: usize) -> Vec<Range<usize>> {
    let mut edges = vec![0.0];
    edges.extend((0..n_bands).map(|k| fmin * 2f64.powi(k as i32)));

    let first_bin_at = |freq: f64| {
        frequencies
            .iter()
            .position(|&f| f >= freq)
            .unwrap_or(frequencies.len())
    };

    let mut bands: Vec<Range<usize>> = edges
        .windows(2)
        .map(|w| first_bin_at(w[0])..first_bin_at(w[1]))
        .collect();
    let last_start = edges.last().map(|&f| first_bin_at(f)).unwrap_or(0);
    bands.push(last_start..frequencies.len());
    bands
}
