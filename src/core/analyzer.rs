// src/core/analyzer.rs
//
// High-level detection API with builder pattern. A `VoiceAnalyzer` wires the
// decoder, feature extractor, scorer and classifier together over one
// immutable configuration and can be shared across threads.

use log::{debug, info};

use super::analysis::{FeatureExtractor, FeatureVector};
use super::classifier::Classifier;
use super::decoder::{decode_bytes, decode_payload, DecodedAudio, Waveform};
use super::scorer::HeuristicScorer;
use crate::config::{DetectorConfig, Preset};
use crate::detection::{AudioInfo, DetectionReport, DetectionResult};
use crate::error::{ConfigError, Result};

/// Builder for VoiceAnalyzer configuration
pub struct AnalyzerBuilder {
    config: DetectorConfig,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
        }
    }

    pub fn preset(mut self, preset: Preset) -> Self {
        self.config = DetectorConfig::from_preset(preset);
        self
    }

    pub fn config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the decision threshold of the current configuration
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.scoring.threshold = threshold;
        self
    }

    pub fn build(self) -> std::result::Result<VoiceAnalyzer, ConfigError> {
        VoiceAnalyzer::with_config(self.config)
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Detection pipeline over one configuration
pub struct VoiceAnalyzer {
    config: DetectorConfig,
    extractor: FeatureExtractor,
    scorer: HeuristicScorer,
    classifier: Classifier,
}

impl VoiceAnalyzer {
    /// Analyzer with the balanced preset
    pub fn new() -> std::result::Result<Self, ConfigError> {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let extractor =
            FeatureExtractor::new(&config.analysis, config.analysis.target_sample_rate)
                .map_err(|e| ConfigError::InvalidParams(e.to_string()))?;

        debug!(
            "Analyzer '{}' ready: {} Hz, frame {} hop {}, threshold {:.2}",
            config.name,
            config.analysis.target_sample_rate,
            config.analysis.frame_size,
            config.analysis.hop_size,
            config.scoring.threshold
        );

        Ok(Self {
            scorer: HeuristicScorer::new(&config.scoring),
            classifier: Classifier::new(config.scoring.threshold)?,
            extractor,
            config,
        })
    }

    /// Create a builder for custom configuration
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Classify a base64-encoded clip
    pub fn detect(&self, payload: &str) -> Result<DetectionResult> {
        Ok(self.detect_base64(payload)?.result)
    }

    /// Full report for a base64-encoded clip
    pub fn detect_base64(&self, payload: &str) -> Result<DetectionReport> {
        let decoded = decode_payload(payload, &self.config.analysis)?;
        self.report_decoded(decoded)
    }

    /// Full report for raw container bytes
    pub fn detect_bytes(&self, bytes: Vec<u8>) -> Result<DetectionReport> {
        let decoded = decode_bytes(bytes, &self.config.analysis)?;
        self.report_decoded(decoded)
    }

    /// Full report for an already decoded mono waveform
    pub fn detect_waveform(&self, waveform: &Waveform) -> Result<DetectionReport> {
        let features = self.extractor.extract(waveform)?;
        self.report_features(features, None)
    }

    /// Extract features only
    pub fn features(&self, waveform: &Waveform) -> Result<FeatureVector> {
        Ok(self.extractor.extract(waveform)?)
    }

    fn report_decoded(&self, decoded: DecodedAudio) -> Result<DetectionReport> {
        debug!(
            "Decoded {} ({} Hz, {} ch) -> {} samples at {} Hz",
            decoded.codec_name,
            decoded.source_sample_rate,
            decoded.source_channels,
            decoded.waveform.len(),
            decoded.waveform.sample_rate()
        );

        let features = self.extractor.extract(&decoded.waveform)?;
        self.report_features(features, Some(AudioInfo::from(&decoded)))
    }

    fn report_features(
        &self,
        features: FeatureVector,
        audio: Option<AudioInfo>,
    ) -> Result<DetectionReport> {
        let scores = self.scorer.score(&features)?;
        let (aggregate_score, result) = self.classifier.classify(&scores)?;

        info!(
            "{} (confidence {:.2}, aggregate {:.3}, {:.1}s)",
            result.classification, result.confidence, aggregate_score, features.duration_secs
        );

        Ok(DetectionReport {
            result,
            aggregate_score,
            threshold: self.classifier.threshold(),
            scores,
            features,
            audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Classification;
    use crate::error::DetectError;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_analyzer_is_shareable() {
        assert_send_sync::<VoiceAnalyzer>();
    }

    #[test]
    fn test_builder_rejects_invalid_threshold() {
        assert!(VoiceAnalyzer::builder().threshold(1.5).build().is_err());
        assert!(VoiceAnalyzer::builder().preset(Preset::Sensitive).build().is_ok());
    }

    #[test]
    fn test_garbage_payload_is_client_fault() {
        let analyzer = VoiceAnalyzer::new().unwrap();
        let err = analyzer.detect("not-base64!!").unwrap_err();
        assert!(matches!(err, DetectError::Decode(_)));
        assert!(err.is_client_fault());
    }

    #[test]
    fn test_constant_tone_waveform() {
        let cycle: Vec<f32> = (0..512)
            .map(|n| 0.5 * (2.0 * std::f32::consts::PI * 10.0 * n as f32 / 512.0).sin())
            .collect();
        let samples: Vec<f32> = cycle.iter().copied().cycle().take(22050 * 2).collect();
        let waveform = Waveform::new(samples, 22050).unwrap();

        let report = VoiceAnalyzer::new().unwrap().detect_waveform(&waveform).unwrap();
        assert_eq!(report.classification(), Classification::AiGenerated);
        assert!(report.confidence() >= 0.8);
        assert!(report.audio.is_none());
    }
}
