//! Core detection pipeline

pub mod analysis;
pub mod analyzer;
pub mod classifier;
pub mod decoder;
pub mod dsp;
pub mod scorer;

pub use analysis::{FeatureExtractor, FeatureVector};
pub use analyzer::{AnalyzerBuilder, VoiceAnalyzer};
pub use classifier::Classifier;
pub use decoder::{DecodedAudio, Waveform};
pub use dsp::SpectralAnalyzer;
pub use scorer::{FamilyScore, HeuristicScorer, ScoreVector};
