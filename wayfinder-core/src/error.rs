use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
