// src/config/profiles.rs
//
// Detector configuration: analysis parameters, per-family scoring and presets.
// A config is built once and passed explicitly into the extractor and scorer.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::dsp::WindowType;
use crate::error::ConfigError;

/// Acoustic feature families extracted from every clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFamily {
    Mfcc,
    SpectralCentroid,
    SpectralRolloff,
    SpectralContrast,
    ZeroCrossingRate,
    Chroma,
    RmsEnergy,
    Tonnetz,
}

impl FeatureFamily {
    pub fn all() -> Vec<Self> {
        vec![
            Self::Mfcc,
            Self::SpectralCentroid,
            Self::SpectralRolloff,
            Self::SpectralContrast,
            Self::ZeroCrossingRate,
            Self::Chroma,
            Self::RmsEnergy,
            Self::Tonnetz,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mfcc => "mfcc",
            Self::SpectralCentroid => "spectral_centroid",
            Self::SpectralRolloff => "spectral_rolloff",
            Self::SpectralContrast => "spectral_contrast",
            Self::ZeroCrossingRate => "zero_crossing_rate",
            Self::Chroma => "chroma",
            Self::RmsEnergy => "rms_energy",
            Self::Tonnetz => "tonnetz",
        }
    }

    /// Parse a family name; accepts `-` for `_` and a few short aliases
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "mfcc" => Some(Self::Mfcc),
            "spectral_centroid" | "centroid" => Some(Self::SpectralCentroid),
            "spectral_rolloff" | "rolloff" => Some(Self::SpectralRolloff),
            "spectral_contrast" | "contrast" => Some(Self::SpectralContrast),
            "zero_crossing_rate" | "zcr" => Some(Self::ZeroCrossingRate),
            "chroma" => Some(Self::Chroma),
            "rms_energy" | "rms" => Some(Self::RmsEnergy),
            "tonnetz" => Some(Self::Tonnetz),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the variance -> syntheticness mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCurve {
    /// Clamped linear ramp from 1.0 at `low` down to 0.0 at `high`
    #[default]
    Linear,
    /// Linear ramp on `ln(variance)`; requires `low > 0`
    LogLinear,
    /// `1 - tanh((v - low) / (high - low))`
    Tanh,
}

/// Empirical variance range for one family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    /// At or below this variance the family looks fully synthetic
    pub low: f64,
    /// At or above this variance the family looks fully natural (linear curves)
    pub high: f64,
}

impl ReferenceRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// Weight and reference range of one scored family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyScoring {
    pub weight: f64,
    pub reference: ReferenceRange,
}

impl FamilyScoring {
    pub fn new(weight: f64, low: f64, high: f64) -> Self {
        Self {
            weight,
            reference: ReferenceRange::new(low, high),
        }
    }
}

/// Scoring and decision parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub curve: ScoreCurve,
    /// Aggregate scores at or above this value are labelled AI-generated
    pub threshold: f64,
    /// Scored families; families missing here are extracted but ignored
    pub families: BTreeMap<FeatureFamily, FamilyScoring>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut families = BTreeMap::new();
        // Variance statistics: dB^2 for MFCC and contrast, Hz^2 for centroid,
        // raw units for the rest.
        families.insert(FeatureFamily::Mfcc, FamilyScoring::new(0.25, 5.0, 60.0));
        families.insert(FeatureFamily::SpectralCentroid, FamilyScoring::new(0.20, 1.0e4, 5.0e5));
        families.insert(FeatureFamily::SpectralContrast, FamilyScoring::new(0.15, 1.0, 40.0));
        families.insert(FeatureFamily::RmsEnergy, FamilyScoring::new(0.15, 1.0e-5, 5.0e-3));
        families.insert(FeatureFamily::ZeroCrossingRate, FamilyScoring::new(0.10, 1.0e-5, 2.0e-3));
        families.insert(FeatureFamily::Chroma, FamilyScoring::new(0.075, 2.0e-3, 0.05));
        families.insert(FeatureFamily::Tonnetz, FamilyScoring::new(0.075, 1.0e-3, 0.03));

        Self {
            curve: ScoreCurve::Linear,
            threshold: 0.5,
            families,
        }
    }
}

impl ScoringConfig {
    pub fn total_weight(&self) -> f64 {
        self.families.values().map(|f| f.weight).sum()
    }

    /// Rescale weights so they sum to 1.0
    pub fn normalize_weights(&mut self) {
        let total = self.total_weight();
        if total > 0.0 && total.is_finite() {
            for scoring in self.families.values_mut() {
                scoring.weight /= total;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.families.is_empty() {
            return Err(ConfigError::InvalidWeights("no scored families".to_string()));
        }

        for (family, scoring) in &self.families {
            if !scoring.weight.is_finite() || scoring.weight < 0.0 {
                return Err(ConfigError::InvalidWeights(format!(
                    "{} has weight {}",
                    family, scoring.weight
                )));
            }

            let ReferenceRange { low, high } = scoring.reference;
            let min_low = match self.curve {
                ScoreCurve::LogLinear => f64::MIN_POSITIVE,
                _ => 0.0,
            };
            if !low.is_finite() || !high.is_finite() || low < min_low || high <= low {
                return Err(ConfigError::InvalidRange {
                    family: *family,
                    low,
                    high,
                });
            }
        }

        let total = self.total_weight();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ConfigError::InvalidWeights(format!(
                "weights sum to {:.6}, expected 1.0",
                total
            )));
        }

        Ok(())
    }
}

/// Framing and spectral analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Every decoded clip is resampled to this rate
    pub target_sample_rate: u32,
    pub frame_size: usize,
    pub hop_size: usize,
    pub window: WindowType,
    pub n_mfcc: usize,
    pub n_mels: usize,
    /// Fraction of spectral energy below the rolloff frequency
    pub rolloff_percent: f64,
    /// Octave bands above `contrast_fmin`; one residual band is added below
    pub contrast_bands: usize,
    pub contrast_fmin: f64,
    pub contrast_quantile: f64,
    /// Dynamic range kept below the clip's peak for log spectra
    pub top_db: f64,
    /// Clips whose peak is below this level are rejected as silent
    pub min_peak_db: f64,
    /// Leading and trailing samples quieter than this many dB below the
    /// peak are dropped before framing; `None` keeps the clip edges
    pub trim_db: Option<f64>,
    pub max_duration_secs: Option<f64>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            target_sample_rate: 22050,
            frame_size: 2048,
            hop_size: 512,
            window: WindowType::Hann,
            n_mfcc: 13,
            n_mels: 40,
            rolloff_percent: 0.85,
            contrast_bands: 6,
            contrast_fmin: 200.0,
            contrast_quantile: 0.02,
            top_db: 80.0,
            min_peak_db: -80.0,
            trim_db: Some(20.0),
            max_duration_secs: Some(60.0),
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidParams(msg));

        if self.target_sample_rate == 0 {
            return invalid("target_sample_rate must be positive".to_string());
        }
        if self.frame_size < 16 {
            return invalid(format!("frame_size {} is too small", self.frame_size));
        }
        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return invalid(format!(
                "hop_size {} must be in 1..={}",
                self.hop_size, self.frame_size
            ));
        }
        if self.n_mels == 0 || self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return invalid(format!(
                "need 1 <= n_mfcc ({}) <= n_mels ({})",
                self.n_mfcc, self.n_mels
            ));
        }
        if !(self.rolloff_percent > 0.0 && self.rolloff_percent <= 1.0) {
            return invalid(format!("rolloff_percent {} not in (0, 1]", self.rolloff_percent));
        }
        if !(self.contrast_quantile > 0.0 && self.contrast_quantile < 0.5) {
            return invalid(format!(
                "contrast_quantile {} not in (0, 0.5)",
                self.contrast_quantile
            ));
        }

        let nyquist = self.target_sample_rate as f64 / 2.0;
        let top_band_start = self.contrast_fmin * 2f64.powi(self.contrast_bands as i32 - 1);
        if self.contrast_bands == 0 || self.contrast_fmin <= 0.0 || top_band_start >= nyquist {
            return invalid(format!(
                "{} contrast bands from {} Hz exceed the {} Hz Nyquist limit",
                self.contrast_bands, self.contrast_fmin, nyquist
            ));
        }
        if !(self.top_db > 0.0) {
            return invalid(format!("top_db {} must be positive", self.top_db));
        }
        if !self.min_peak_db.is_finite() {
            return invalid("min_peak_db must be finite".to_string());
        }
        if let Some(trim_db) = self.trim_db {
            if !(trim_db > 0.0) {
                return invalid(format!("trim_db {} must be positive", trim_db));
            }
        }
        if let Some(limit) = self.max_duration_secs {
            if !(limit > 0.0) {
                return invalid(format!("max_duration_secs {} must be positive", limit));
            }
        }

        Ok(())
    }
}

/// Preset decision policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Default weights, threshold 0.5
    Balanced,
    /// Flags AI-generated audio more readily (threshold 0.4)
    Sensitive,
    /// Requires stronger evidence before flagging (threshold 0.6)
    Conservative,
    /// User-defined settings
    Custom,
}

impl Preset {
    pub fn all() -> Vec<Self> {
        vec![Self::Balanced, Self::Sensitive, Self::Conservative]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Sensitive => "sensitive",
            Self::Conservative => "conservative",
            Self::Custom => "custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Balanced => "Default weights and a neutral 0.5 decision threshold",
            Self::Sensitive => "Lower threshold, catches more synthetic speech",
            Self::Conservative => "Higher threshold, fewer false AI verdicts",
            Self::Custom => "User-defined configuration",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "balanced" | "default" | "standard" => Some(Self::Balanced),
            "sensitive" => Some(Self::Sensitive),
            "conservative" | "strict" => Some(Self::Conservative),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    fn threshold(&self) -> f64 {
        match self {
            Self::Sensitive => 0.4,
            Self::Conservative => 0.6,
            Self::Balanced | Self::Custom => 0.5,
        }
    }
}

/// Complete, immutable detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub name: String,
    pub preset: Preset,
    pub analysis: AnalysisParams,
    pub scoring: ScoringConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl DetectorConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let scoring = ScoringConfig {
            threshold: preset.threshold(),
            ..ScoringConfig::default()
        };
        Self {
            name: preset.name().to_string(),
            preset,
            analysis: AnalysisParams::default(),
            scoring,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.scoring.validate()
    }

    /// Parse and validate a JSON config; omitted fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DetectorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for custom configurations
pub struct ConfigBuilder {
    config: DetectorConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
        }
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self {
            config: DetectorConfig::from_preset(preset),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.scoring.threshold = threshold;
        self
    }

    pub fn curve(mut self, curve: ScoreCurve) -> Self {
        self.config.scoring.curve = curve;
        self
    }

    /// Add or replace a scored family
    pub fn family(mut self, family: FeatureFamily, weight: f64, low: f64, high: f64) -> Self {
        self.config
            .scoring
            .families
            .insert(family, FamilyScoring::new(weight, low, high));
        self
    }

    pub fn family_weight(mut self, family: FeatureFamily, weight: f64) -> Self {
        if let Some(scoring) = self.config.scoring.families.get_mut(&family) {
            scoring.weight = weight;
        }
        self
    }

    pub fn without_family(mut self, family: FeatureFamily) -> Self {
        self.config.scoring.families.remove(&family);
        self
    }

    pub fn analysis(mut self, params: AnalysisParams) -> Self {
        self.config.analysis = params;
        self
    }

    pub fn target_sample_rate(mut self, rate: u32) -> Self {
        self.config.analysis.target_sample_rate = rate;
        self
    }

    pub fn framing(mut self, frame_size: usize, hop_size: usize) -> Self {
        self.config.analysis.frame_size = frame_size;
        self.config.analysis.hop_size = hop_size;
        self
    }

    pub fn trim(mut self, trim_db: Option<f64>) -> Self {
        self.config.analysis.trim_db = trim_db;
        self
    }

    pub fn max_duration(mut self, limit_secs: Option<f64>) -> Self {
        self.config.analysis.max_duration_secs = limit_secs;
        self
    }

    /// Normalize weights to sum to 1.0, then validate
    pub fn build(mut self) -> Result<DetectorConfig, ConfigError> {
        self.config.preset = Preset::Custom;
        self.config.scoring.normalize_weights();
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.scoring.total_weight() - 1.0).abs() < 1e-9);
        assert!(!config.scoring.families.contains_key(&FeatureFamily::SpectralRolloff));
    }

    #[test]
    fn test_presets_shift_threshold() {
        let sensitive = DetectorConfig::from_preset(Preset::Sensitive);
        let conservative = DetectorConfig::from_preset(Preset::Conservative);
        assert!(sensitive.scoring.threshold < 0.5);
        assert!(conservative.scoring.threshold > 0.5);
        for preset in Preset::all() {
            assert!(DetectorConfig::from_preset(preset).validate().is_ok());
            assert_eq!(Preset::from_name(preset.name()), Some(preset));
        }
    }

    #[test]
    fn test_family_names_round_trip() {
        for family in FeatureFamily::all() {
            assert_eq!(FeatureFamily::from_name(family.name()), Some(family));
        }
        assert_eq!(FeatureFamily::from_name("ZCR"), Some(FeatureFamily::ZeroCrossingRate));
        assert_eq!(FeatureFamily::from_name("spectral-contrast"), Some(FeatureFamily::SpectralContrast));
        assert_eq!(FeatureFamily::from_name("pitch"), None);
    }

    #[test]
    fn test_builder_normalizes_weights() {
        let config = ConfigBuilder::new()
            .name("rolloff too")
            .family(FeatureFamily::SpectralRolloff, 0.25, 1.0e4, 1.0e6)
            .build()
            .unwrap();

        assert_eq!(config.preset, Preset::Custom);
        assert!((config.scoring.total_weight() - 1.0).abs() < 1e-9);
        assert!(config.scoring.families[&FeatureFamily::SpectralRolloff].weight > 0.19);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_threshold = ConfigBuilder::new().threshold(1.0).build();
        assert!(matches!(bad_threshold, Err(ConfigError::InvalidThreshold(_))));

        let bad_range = ConfigBuilder::new()
            .family(FeatureFamily::Chroma, 0.1, 0.5, 0.1)
            .build();
        assert!(matches!(bad_range, Err(ConfigError::InvalidRange { .. })));

        let bad_hop = ConfigBuilder::new().framing(1024, 2048).build();
        assert!(matches!(bad_hop, Err(ConfigError::InvalidParams(_))));

        let bad_trim = ConfigBuilder::new().trim(Some(0.0)).build();
        assert!(matches!(bad_trim, Err(ConfigError::InvalidParams(_))));
        assert!(ConfigBuilder::new().trim(None).build().is_ok());

        // Unnormalized weights are only accepted through the builder
        let mut raw = DetectorConfig::default();
        raw.scoring.families.get_mut(&FeatureFamily::Mfcc).unwrap().weight = 0.9;
        assert!(matches!(raw.validate(), Err(ConfigError::InvalidWeights(_))));
    }

    #[test]
    fn test_log_linear_requires_positive_low() {
        let result = ConfigBuilder::new()
            .curve(ScoreCurve::LogLinear)
            .family(FeatureFamily::Mfcc, 0.25, 0.0, 60.0)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn test_json_partial_override() {
        let config = DetectorConfig::from_json_str(
            r#"{ "name": "tuned", "scoring": { "threshold": 0.55 } }"#,
        )
        .unwrap();
        assert_eq!(config.name, "tuned");
        assert!((config.scoring.threshold - 0.55).abs() < 1e-12);
        // Families fall back to the defaults when omitted
        assert_eq!(config.scoring.families.len(), 7);
        assert_eq!(config.analysis, AnalysisParams::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = DetectorConfig::from_preset(Preset::Conservative);
        let json = config.to_json_pretty().unwrap();
        let parsed = DetectorConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.preset, Preset::Conservative);
        assert_eq!(parsed.analysis.frame_size, config.analysis.frame_size);
        assert!((parsed.scoring.threshold - config.scoring.threshold).abs() < 1e-12);
        assert_eq!(
            parsed.scoring.families.keys().collect::<Vec<_>>(),
            config.scoring.families.keys().collect::<Vec<_>>()
        );
    }
}
