//! Configuration module for VoiceCheckr

mod profiles;

pub use profiles::{
    AnalysisParams, ConfigBuilder, DetectorConfig, FamilyScoring, FeatureFamily, Preset,
    ReferenceRange, ScoreCurve, ScoringConfig,
};
