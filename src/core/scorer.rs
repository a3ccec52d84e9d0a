// src/core/scorer.rs
//
// Heuristic syntheticness scoring: low temporal variance in a feature family
// reads as machine-like, high variance as natural. Each scored family maps
// its variance statistic through a decreasing curve into [0, 1].

use std::collections::BTreeMap;

use log::trace;
use serde::Serialize;

use crate::config::{FamilyScoring, FeatureFamily, ReferenceRange, ScoreCurve, ScoringConfig};
use crate::core::analysis::FeatureVector;
use crate::error::DetectError;

/// Score of one family together with its inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FamilyScore {
    /// Syntheticness in [0, 1]; higher is more AI-like
    pub score: f64,
    /// Variance statistic the score was derived from
    pub variance: f64,
    pub weight: f64,
}

/// Per-family syntheticness scores
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreVector {
    scores: BTreeMap<FeatureFamily, FamilyScore>,
}

impl ScoreVector {
    pub fn get(&self, family: FeatureFamily) -> Option<&FamilyScore> {
        self.scores.get(&family)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureFamily, &FamilyScore)> {
        self.scores.iter().map(|(f, s)| (*f, s))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Weighted sum of the family scores
    pub fn weighted_sum(&self) -> f64 {
        self.scores.values().map(|s| s.weight * s.score).sum()
    }

    fn insert(&mut self, family: FeatureFamily, score: FamilyScore) {
        self.scores.insert(family, score);
    }
}

/// Map a variance statistic to a syntheticness score
///
/// Non-increasing in `variance` for every curve and always within [0, 1].
pub fn curve_score(curve: ScoreCurve, variance: f64, reference: ReferenceRange) -> f64 {
    let ReferenceRange { low, high } = reference;
    let span = high - low;
    if span <= 0.0 {
        return if variance <= low { 1.0 } else { 0.0 };
    }

    let score = match curve {
        ScoreCurve::Linear => 1.0 - ((variance - low) / span).clamp(0.0, 1.0),
        ScoreCurve::LogLinear => {
            let (log_low, log_high) = (low.max(f64::MIN_POSITIVE).ln(), high.ln());
            let log_v = variance.max(f64::MIN_POSITIVE).ln();
            1.0 - ((log_v - log_low) / (log_high - log_low)).clamp(0.0, 1.0)
        }
        ScoreCurve::Tanh => 1.0 - ((variance - low).max(0.0) / span).tanh(),
    };

    score.clamp(0.0, 1.0)
}

/// Stateless scorer over a fixed scoring configuration
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    curve: ScoreCurve,
    families: BTreeMap<FeatureFamily, FamilyScoring>,
}

impl HeuristicScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            curve: config.curve,
            families: config.families.clone(),
        }
    }

    pub fn score(&self, features: &FeatureVector) -> Result<ScoreVector, DetectError> {
        let mut scores = ScoreVector::default();

        for (family, scoring) in &self.families {
            let variance = features.get(*family).variance_statistic();
            if !variance.is_finite() {
                return Err(DetectError::Internal(format!(
                    "variance statistic of {} is not finite",
                    family
                )));
            }

            let score = curve_score(self.curve, variance, scoring.reference);
            trace!("{}: variance {:.4e} -> score {:.3}", family, variance, score);

            scores.insert(
                *family,
                FamilyScore {
                    score,
                    variance,
                    weight: scoring.weight,
                },
            );
        }

        Ok(scores)
    }
}
