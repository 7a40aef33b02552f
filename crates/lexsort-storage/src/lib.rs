//! # lexsort-storage
//!
//! RocksDB-backed persistence for lexsort. One database per project,
//! with column families for:
//! - cached embedding payloads, keyed by (model, text)
//! - target/category items, keyed by zero-padded id for cursor paging
//! - persisted classifier models, upserted per owner
//!
//! Implements the store traits from `lexsort-types`; everything above
//! this crate is storage-agnostic.

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Database, READY_BATCH_SIZE};
pub use error::StorageError;
