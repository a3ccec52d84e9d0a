// src/core/classifier.rs
//
// Turns a score vector into a verdict. Stateless: the aggregate is the
// weighted sum of family scores and the confidence grows linearly with the
// distance from the decision threshold.

use crate::core::scorer::ScoreVector;
use crate::detection::{Classification, DetectionResult};
use crate::error::{ConfigError, DetectError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    threshold: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl Classifier {
    /// `threshold` must lie strictly between 0 and 1
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Weighted sum of family scores, clamped to [0, 1]
    pub fn aggregate(&self, scores: &ScoreVector) -> Result<f64, DetectError> {
        if scores.is_empty() {
            return Err(DetectError::Internal("no family scores to aggregate".to_string()));
        }
        let sum = scores.weighted_sum();
        if !sum.is_finite() {
            return Err(DetectError::Internal(format!("aggregate score is {}", sum)));
        }
        Ok(sum.clamp(0.0, 1.0))
    }

    /// Verdict for an aggregate score; the threshold itself is AI-generated
    pub fn decide(&self, aggregate: f64) -> DetectionResult {
        let thr = self.threshold;
        if aggregate >= thr {
            let confidence = 0.5 + 0.5 * (aggregate - thr) / (1.0 - thr);
            DetectionResult::new(Classification::AiGenerated, confidence)
        } else {
            let confidence = 0.5 + 0.5 * (thr - aggregate) / thr;
            DetectionResult::new(Classification::Human, confidence)
        }
    }

    /// Aggregate and decide in one step
    pub fn classify(&self, scores: &ScoreVector) -> Result<(f64, DetectionResult), DetectError> {
        let aggregate = self.aggregate(scores)?;
        Ok((aggregate, self.decide(aggregate)))
    }
}
