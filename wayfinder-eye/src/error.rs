//! Error types for wayfinder-eye

use std::path::PathBuf;
use thiserror::Error;
use wayfinder_core::Error as CoreError;

/// Camera failures. Each one skips a single tick.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Camera error: {0}")]
    Device(String),

    #[error("No images found in {0}")]
    NoImages(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Vision request and response failures
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Vision API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed vision response: {0}")]
    Malformed(String),

    #[error("Vision response contained no text")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<AcquisitionError> for CoreError {
    fn from(err: AcquisitionError) -> Self {
        CoreError::Acquisition(err.to_string())
    }
}

impl From<AnalysisError> for CoreError {
    fn from(err: AnalysisError) -> Self {
        CoreError::Analysis(err.to_string())
    }
}
