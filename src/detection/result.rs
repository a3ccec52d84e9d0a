//! Detection result types

use serde::{Deserialize, Serialize};

use crate::core::analysis::FeatureVector;
use crate::core::decoder::DecodedAudio;
use crate::core::scorer::ScoreVector;

/// Binary verdict for one clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "AI_GENERATED")]
    AiGenerated,
    #[serde(rename = "HUMAN")]
    Human,
}

impl Classification {
    /// Wire label, as serialized in responses
    pub fn label(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "AI_GENERATED",
            Classification::Human => "HUMAN",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "✗",
            Classification::Human => "✓",
        }
    }

    pub fn is_ai_generated(&self) -> bool {
        matches!(self, Classification::AiGenerated)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Verdict plus confidence in [0, 1]
///
/// Serializes to `{"classification": ..., "confidence": ...}` with the
/// confidence rounded to two decimals; the full-precision value stays
/// available through `confidence`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub classification: Classification,
    #[serde(serialize_with = "serialize_rounded")]
    pub confidence: f64,
}

impl DetectionResult {
    pub fn new(classification: Classification, confidence: f64) -> Self {
        Self {
            classification,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Confidence rounded to two decimals for presentation
    pub fn rounded_confidence(&self) -> f64 {
        round2(self.confidence)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn serialize_rounded<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

/// Source stream details recorded while decoding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioInfo {
    pub codec: String,
    pub source_sample_rate: u32,
    pub source_channels: usize,
    pub analysis_sample_rate: u32,
    pub duration_secs: f64,
}

impl From<&DecodedAudio> for AudioInfo {
    fn from(decoded: &DecodedAudio) -> Self {
        Self {
            codec: decoded.codec_name.clone(),
            source_sample_rate: decoded.source_sample_rate,
            source_channels: decoded.source_channels,
            analysis_sample_rate: decoded.waveform.sample_rate(),
            duration_secs: decoded.duration_secs(),
        }
    }
}

/// Everything one detection run produced
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    #[serde(flatten)]
    pub result: DetectionResult,
    pub aggregate_score: f64,
    pub threshold: f64,
    pub scores: ScoreVector,
    pub features: FeatureVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioInfo>,
}

impl DetectionReport {
    pub fn classification(&self) -> Classification {
        self.result.classification
    }

    pub fn confidence(&self) -> f64 {
        self.result.confidence
    }
}
