//! Error taxonomy for the detection pipeline

use thiserror::Error;

use crate::config::FeatureFamily;

/// Result alias for full pipeline runs.
pub type Result<T> = std::result::Result<T, DetectError>;

/// Failures while turning an encoded payload into a waveform
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("audio payload is empty")]
    EmptyPayload,

    #[error("invalid base64 audio: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("unsupported or corrupt audio container: {0}")]
    UnsupportedContainer(String),

    #[error("no decodable audio track in payload")]
    NoAudioTrack,

    #[error("audio stream does not declare a sample rate")]
    MissingSampleRate,

    #[error("decoded waveform is empty")]
    EmptyWaveform,

    #[error("audio is {duration_secs:.1}s long, limit is {limit_secs:.1}s")]
    TooLong { duration_secs: f64, limit_secs: f64 },

    #[error("resampling {from} Hz -> {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },
}

impl From<symphonia::core::errors::Error> for DecodeError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        DecodeError::UnsupportedContainer(err.to_string())
    }
}

/// Failures while deriving acoustic features from a waveform
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureExtractionError {
    #[error("waveform has {samples} samples, shorter than one {frame_size}-sample analysis frame")]
    TooShort { samples: usize, frame_size: usize },

    #[error("waveform is silent (peak {peak_db:.1} dBFS)")]
    Silent { peak_db: f64 },

    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("non-finite {family} statistic")]
    NonFinite { family: FeatureFamily },
}

impl FeatureExtractionError {
    /// Whether the input audio is at fault (as opposed to a numeric edge case)
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, FeatureExtractionError::NonFinite { .. })
    }
}

/// Invalid detector configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid family weights: {0}")]
    InvalidWeights(String),

    #[error("decision threshold must lie strictly between 0 and 1, got {0}")]
    InvalidThreshold(f64),

    #[error("invalid reference range for {family}: [{low}, {high}]")]
    InvalidRange { family: FeatureFamily, low: f64, high: f64 },

    #[error("invalid analysis parameters: {0}")]
    InvalidParams(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Any failure of a full detection run
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("feature extraction error: {0}")]
    FeatureExtraction(#[from] FeatureExtractionError),

    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl DetectError {
    /// Client faults map to "bad input"; everything else is an internal fault
    pub fn is_client_fault(&self) -> bool {
        match self {
            DetectError::Decode(_) => true,
            DetectError::FeatureExtraction(e) => e.is_client_fault(),
            DetectError::Unreadable { .. } => true,
            DetectError::Internal(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_classes() {
        let decode = DetectError::from(DecodeError::EmptyWaveform);
        assert!(decode.is_client_fault());

        let short = DetectError::from(FeatureExtractionError::TooShort {
            samples: 10,
            frame_size: 2048,
        });
        assert!(short.is_client_fault());

        let nan = DetectError::from(FeatureExtractionError::NonFinite {
            family: FeatureFamily::Mfcc,
        });
        assert!(!nan.is_client_fault());

        assert!(!DetectError::Internal("boom".into()).is_client_fault());

        let missing = DetectError::Unreadable {
            path: "clip.wav".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(missing.is_client_fault());
        assert!(missing.to_string().starts_with("cannot read clip.wav"));
    }

    #[test]
    fn test_messages_name_the_family() {
        let err = FeatureExtractionError::NonFinite {
            family: FeatureFamily::SpectralCentroid,
        };
        assert_eq!(err.to_string(), "non-finite spectral_centroid statistic");
    }
}
