//! Classifier error types.

use lexsort_embeddings::EmbeddingError;
use lexsort_types::StoreError;
use thiserror::Error;

/// Errors from training, prediction, or model persistence.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// A sample's embedding has the wrong dimension
    #[error("Sample {index}: embedding dimension {actual} != expected {expected}")]
    InvalidEmbeddingDimension {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// A sample's embedding contains NaN or infinity
    #[error("Sample {index}: embedding contains non-finite values")]
    NonFiniteEmbedding { index: usize },

    /// No samples were provided
    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// Input dimension does not match the model
    #[error("Input dimension {actual} != model dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted model payload is invalid
    #[error("Model payload error: {0}")]
    Model(String),

    /// Embedding resolution failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Model store error
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClassifyError {
    /// Machine-checkable code for error records on the progress stream.
    pub fn code(&self) -> &'static str {
        match self {
            ClassifyError::InvalidEmbeddingDimension { .. } => "invalid_embedding_dimension",
            ClassifyError::NonFiniteEmbedding { .. } => "non_finite_embedding",
            ClassifyError::EmptyTrainingSet => "empty_training_set",
            ClassifyError::DimensionMismatch { .. } => "dimension_mismatch",
            ClassifyError::Model(_) => "model_payload",
            ClassifyError::Embedding(e) => e.code(),
            ClassifyError::Store(_) => "storage",
        }
    }
}
