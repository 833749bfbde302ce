//! Error types for the generation client.

use thiserror::Error;

/// Errors from the generation service.
///
/// Every variant is terminal for one generation attempt only; a failed
/// generation is retryable by resubmitting identical parameters and never
/// affects the player.
#[derive(Debug, Error)]
pub enum GenError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request or returned a non-success status.
    #[error("Generation service error: {0}")]
    Service(String),

    /// The job itself reported `failed`.
    #[error("Generation failed: {0}")]
    Failed(String),

    /// The referenced generation or track does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local audio synthesis/encoding failure (mock path).
    #[error("Encode error: {0}")]
    Encode(String),
}

/// Result type alias for generation operations.
pub type GenResult<T> = std::result::Result<T, GenError>;
