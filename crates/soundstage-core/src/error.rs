//! Error types for SoundStage.

use thiserror::Error;

/// Main error type for SoundStage operations.
#[derive(Error, Debug)]
pub enum SoundStageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load error: {0}")]
    Load(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for SoundStage operations.
pub type Result<T> = std::result::Result<T, SoundStageError>;
