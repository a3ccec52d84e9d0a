//! Detection verdicts and reports

mod result;

pub use result::{AudioInfo, Classification, DetectionReport, DetectionResult};
