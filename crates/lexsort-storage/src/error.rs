//! Storage error types.

use lexsort_types::StoreError;
use thiserror::Error;

/// Errors from the RocksDB layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    Rocks(#[from] rocksdb::Error),

    /// Column family missing from the database
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Malformed storage key
    #[error("Key error: {0}")]
    Key(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Rocks(e) => StoreError::Backend(e.to_string()),
            StorageError::ColumnFamilyNotFound(name) => StoreError::ColumnFamilyNotFound(name),
            StorageError::Key(msg) => StoreError::Key(msg),
            StorageError::Serialization(e) => StoreError::Serialization(e.to_string()),
        }
    }
}
