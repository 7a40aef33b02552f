//! Store trait seams between the engine and its persistence layer.
//!
//! `lexsort-storage` implements these over RocksDB; tests use in-memory
//! implementations. The engine deals in raw payload bytes at this
//! boundary; vector encoding lives in `lexsort-embeddings`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::{Item, ItemKind};

/// Error surfaced by any backing store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing database error
    #[error("Storage error: {0}")]
    Backend(String),

    /// Column family missing from the database
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Malformed storage key
    #[error("Key error: {0}")]
    Key(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Key-value store for embedding payloads, unique per (text, model).
pub trait EmbeddingStore: Send + Sync {
    /// Look up one payload.
    fn get_payload(&self, model: &str, text: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Look up many payloads; the result is aligned with `texts` and
    /// holds `None` for misses. Callers are responsible for splitting
    /// oversized key lists (see the cache's sub-query limit).
    fn multi_get_payload(
        &self,
        model: &str,
        texts: &[&str],
    ) -> Result<Vec<Option<Vec<u8>>>, StoreError>;

    /// Idempotent overwrite of one payload.
    fn put_payload(&self, model: &str, text: &str, payload: &[u8]) -> Result<(), StoreError>;
}

/// Paged access to the target and category collections.
pub trait ItemStore: Send + Sync {
    /// Items with `id > after_id`, ordered by id, at most `limit`.
    fn page_after(
        &self,
        kind: ItemKind,
        after_id: u64,
        limit: usize,
    ) -> Result<Vec<Item>, StoreError>;

    /// Total number of items of this kind.
    fn count(&self, kind: ItemKind) -> Result<u64, StoreError>;

    /// Flag items whose embeddings are now cached so future runs skip
    /// them. Implementations apply the update in bounded batches.
    fn mark_ready(&self, kind: ItemKind, ids: &[u64]) -> Result<(), StoreError>;
}

/// Persisted classifier model envelope, upserted per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedModel {
    /// Human-facing model name
    pub model_name: String,
    /// Version tag of the trainer that produced the payload
    pub vector_model_tag: String,
    /// JSON-serialized `ClassifierModel`
    pub payload: String,
}

/// Storage for persisted classifier models.
pub trait ModelStore: Send + Sync {
    /// Fetch the model for an owner, if any.
    fn get_model(&self, owner: &str) -> Result<Option<PersistedModel>, StoreError>;

    /// Overwrite the owner's model (upsert-by-owner).
    fn put_model(&self, owner: &str, model: &PersistedModel) -> Result<(), StoreError>;
}
