//! VoiceCheckr - Detect AI-generated speech
//!
//! Classifies a voice recording as `AI_GENERATED` or `HUMAN` from how much
//! its acoustic features move over time. Synthetic speech tends to hold
//! pitch, timbre and loudness unnaturally steady; natural speech does not.
//!
//! ## Pipeline
//!
//! 1. **Decode** (`core::decoder`): base64 or raw container bytes → mono
//!    waveform at 22050 Hz (symphonia, rubato)
//! 2. **Extract** (`core::analysis`): framed STFT → MFCC, spectral centroid,
//!    rolloff and contrast, zero-crossing rate, chroma, RMS energy, tonnetz,
//!    each summarized by per-dimension mean and variance
//! 3. **Score** (`core::scorer`): variance statistic of each family → a
//!    syntheticness score in [0, 1]
//! 4. **Classify** (`core::classifier`): weighted aggregate against a
//!    threshold → verdict and confidence
//!
//! ## Module Structure
//!
//! - `core` - Decoding, DSP, feature extraction, scoring and the analyzer
//! - `config` - Presets, scoring weights and analysis parameters
//! - `detection` - Verdict and report types
//! - `serve` - HTTP front end
//! - `cli` - Command-line interface
//! - `testgen` - Synthetic reference clips
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voicecheckr::{Preset, VoiceAnalyzer};
//!
//! let analyzer = VoiceAnalyzer::builder().preset(Preset::Balanced).build()?;
//! let result = analyzer.detect(&base64_mp3)?;
//!
//! println!("{} ({:.2})", result.classification, result.rounded_confidence());
//! ```
//!
//! ## Presets
//!
//! | Preset       | Threshold | Use Case                               |
//! |--------------|-----------|----------------------------------------|
//! | Balanced     | 0.50      | General screening                      |
//! | Sensitive    | 0.40      | Catch more synthetic speech            |
//! | Conservative | 0.60      | Fewer false AI verdicts                |

// Core detection pipeline
pub mod core;

// Command-line interface
pub mod cli;

// Configuration and presets
pub mod config;

// Detection result types
pub mod detection;

// Error types
pub mod error;

// HTTP front end
pub mod serve;

// Synthetic test signals
pub mod testgen;

// Re-export commonly used types at crate root for convenience
pub use config::{ConfigBuilder, DetectorConfig, FeatureFamily, Preset, ScoreCurve};
pub use core::{
    AnalyzerBuilder, Classifier, DecodedAudio, FeatureExtractor, FeatureVector, HeuristicScorer,
    ScoreVector, VoiceAnalyzer, Waveform,
};
pub use detection::{Classification, DetectionReport, DetectionResult};
pub use error::{ConfigError, DecodeError, DetectError, FeatureExtractionError, Result};
