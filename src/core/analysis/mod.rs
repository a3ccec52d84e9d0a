//! Acoustic feature extraction
//!
//! Contains the frame-level descriptors the detector summarizes:
//! - MFCC (mel filterbank, log compression, DCT)
//! - Spectral centroid, rolloff and contrast
//! - Zero-crossing rate and RMS energy
//! - Chroma and its tonnetz projection

mod chroma;
mod features;
mod mfcc;

pub use chroma::{pitch_class, tonnetz, ChromaMap, PITCH_CLASSES, TONNETZ_DIMS};
pub use features::{extract_features, FamilyStats, FeatureExtractor, FeatureVector};
pub use mfcc::{hz_to_mel, mel_to_hz, Dct, MelFilterbank, MfccExtractor};
