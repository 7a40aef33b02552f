//! Engine error types.

use lexsort_classify::ClassifyError;
use lexsort_embeddings::EmbeddingError;
use lexsort_match::MatchError;
use lexsort_storage::StorageError;
use thiserror::Error;

/// Errors from job orchestration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Database open or access failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Embedding resolution failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// The matching run failed
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Training or prediction failed
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// Configuration could not be loaded or failed validation
    #[error("Config error: {0}")]
    Config(String),

    /// An input file could not be read or parsed
    #[error("Input error: {0}")]
    Input(String),

    /// No model has been trained for the requested owner
    #[error("No model persisted for owner {0}")]
    ModelNotFound(String),
}

impl EngineError {
    /// Machine-checkable code for the terminal error record.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Storage(_) => "storage",
            EngineError::Embedding(e) => e.code(),
            EngineError::Match(e) => e.code(),
            EngineError::Classify(e) => e.code(),
            EngineError::Config(_) => "config",
            EngineError::Input(_) => "invalid_input",
            EngineError::ModelNotFound(_) => "model_not_found",
        }
    }
}
