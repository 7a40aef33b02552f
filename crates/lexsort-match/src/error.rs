//! Matcher error types.

use lexsort_embeddings::EmbeddingError;
use lexsort_types::StoreError;
use thiserror::Error;

/// Errors from a matching run.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Embedding resolution failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Item store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The run was cancelled cooperatively
    #[error("Matching cancelled")]
    Cancelled,
}

impl MatchError {
    /// Machine-checkable code for error records on the progress stream.
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Embedding(e) => e.code(),
            MatchError::Store(_) => "storage",
            MatchError::Cancelled => "cancelled",
        }
    }
}
