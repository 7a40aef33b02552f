//! Embedding error types.

use lexsort_types::StoreError;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Provider rejected the credentials; fatal, never retried
    #[error("Provider authentication failed (status {status}): {message}")]
    ProviderAuth { status: u16, message: String },

    /// Provider rate limit hit; surfaced distinctly so callers can back off
    #[error("Provider rate limited: {message}")]
    ProviderRateLimited { message: String },

    /// Transport-level or unexpected provider failure
    #[error("Provider transport error: {message}")]
    ProviderTransport { message: String },

    /// cache_only was requested and these texts were not cached
    #[error("{} text(s) missing from cache with cache_only set", missing.len())]
    CacheOnlyMiss { missing: Vec<String> },

    /// Cached payload could not be decoded by any known format
    #[error("Malformed cached payload: {0}")]
    MalformedPayload(String),

    /// Embedding dimension does not match expectation
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Backing store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation was cancelled cooperatively
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EmbeddingError {
    /// Machine-checkable code for error records on the progress stream.
    pub fn code(&self) -> &'static str {
        match self {
            EmbeddingError::ProviderAuth { .. } => "provider_auth",
            EmbeddingError::ProviderRateLimited { .. } => "provider_rate_limited",
            EmbeddingError::ProviderTransport { .. } => "provider_transport",
            EmbeddingError::CacheOnlyMiss { .. } => "cache_only_miss",
            EmbeddingError::MalformedPayload(_) => "malformed_payload",
            EmbeddingError::DimensionMismatch { .. } => "dimension_mismatch",
            EmbeddingError::Store(_) => "storage",
            EmbeddingError::Cancelled => "cancelled",
            EmbeddingError::InvalidInput(_) => "invalid_input",
        }
    }
}
