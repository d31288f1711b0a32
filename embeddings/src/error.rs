//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
///
/// Every variant is surfaced to the caller. A similarity score computed
/// from a partial or degraded embedding is never returned in place of an
/// error.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The text to embed was empty or whitespace only.
    #[error("cannot embed empty text")]
    EmptyInput,

    /// The backing embedding call could not be completed.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Vectors with different (or zero) dimensions were compared.
    #[error("dimension mismatch: left has {left} components, right has {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A vector with zero magnitude was compared.
    #[error("degenerate vector: magnitude is zero")]
    DegenerateVector,

    /// Provider configuration is invalid or incomplete.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::ProviderUnavailable(format!("http error: {err}"))
    }
}

impl From<toml::de::Error> for EmbeddingError {
    fn from(err: toml::de::Error) -> Self {
        EmbeddingError::Config(format!("invalid toml: {err}"))
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::Config(format!("io error: {err}"))
    }
}
