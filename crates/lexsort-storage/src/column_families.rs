//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - embeddings: write-once binary vector payloads, read-heavy
//! - items: target/category records scanned in id order
//! - models: a handful of persisted classifier models

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family for cached embedding payloads
pub const CF_EMBEDDINGS: &str = "embeddings";

/// Column family for target/category items
pub const CF_ITEMS: &str = "items";

/// Column family for persisted classifier models
pub const CF_MODELS: &str = "models";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_EMBEDDINGS, CF_ITEMS, CF_MODELS];

/// Options for the embeddings CF: payloads are already compact binary,
/// but Zstd still wins on the repeated key prefixes.
fn embeddings_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Options for the items CF: small JSON records, scanned by prefix.
fn items_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Options for the models CF.
fn models_options() -> Options {
    Options::default()
}

/// Build descriptors for all column families.
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_EMBEDDINGS, embeddings_options()),
        ColumnFamilyDescriptor::new(CF_ITEMS, items_options()),
        ColumnFamilyDescriptor::new(CF_MODELS, models_options()),
    ]
}
