//! Error types for wayfinder-spk

use std::time::Duration;
use thiserror::Error;
use wayfinder_core::Error as CoreError;

/// Speech synthesis job errors (submit, poll, timeout)
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Text cannot be empty")]
    EmptyText,

    #[error("Synthesis API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid synthesis response: {0}")]
    InvalidResponse(String),

    #[error("Job {0} is done but has no result URL")]
    MissingResultUrl(String),

    #[error("Job {request_id} timed out after {elapsed:?}")]
    TimedOut { request_id: String, elapsed: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Audio playback errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Invalid audio URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to open audio source: {0}")]
    Open(String),

    #[error("Failed to start playback: {0}")]
    Start(String),

    #[error("Playback manager has been released")]
    Released,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Haptic device errors. Never surfaced past the notification orchestrator.
#[derive(Error, Debug)]
pub enum HapticError {
    #[error("Device has no vibrator")]
    Unavailable,

    #[error("Haptic device error: {0}")]
    Device(String),
}

/// Failure of one spoken notification attempt
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl From<SynthesisError> for CoreError {
    fn from(err: SynthesisError) -> Self {
        CoreError::Synthesis(err.to_string())
    }
}

impl From<PlaybackError> for CoreError {
    fn from(err: PlaybackError) -> Self {
        CoreError::Playback(err.to_string())
    }
}

impl From<SpeechError> for CoreError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Synthesis(e) => e.into(),
            SpeechError::Playback(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_error_display() {
        let err = SynthesisError::TimedOut {
            request_id: "r1".to_string(),
            elapsed: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "Job r1 timed out after 30s");

        let err = SynthesisError::Status {
            status: 503,
            body: "busy".to_string(),
        };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_speech_error_to_core_error() {
        let err: CoreError = SpeechError::from(SynthesisError::MissingResultUrl("r9".to_string())).into();
        match err {
            CoreError::Synthesis(msg) => assert!(msg.contains("r9")),
            other => panic!("Expected Synthesis error, got {other:?}"),
        }

        let err: CoreError = SpeechError::from(PlaybackError::Released).into();
        assert!(matches!(err, CoreError::Playback(_)));
    }
}
