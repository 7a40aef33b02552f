//! # lexsort-embeddings
//!
//! Everything between the engine and the embedding provider:
//! - a versioned binary vector codec with a legacy textual decode path
//! - the persistent write-through [`EmbeddingCache`]
//! - the HTTP [`provider`] client with typed auth/rate-limit/transport
//!   errors
//! - the [`EmbeddingFetcher`], which dedups, chunks, and sequentially
//!   fetches cache misses while reporting progress
//!
//! The cache and fetcher are plain job-owned values, constructed
//! explicitly per job; there is no module-level singleton.

pub mod cache;
pub mod encoding;
pub mod error;
pub mod fetcher;
pub mod provider;

#[cfg(test)]
pub(crate) mod testutil;

pub use cache::{EmbeddingCache, MAX_KEYS_PER_QUERY};
pub use error::EmbeddingError;
pub use fetcher::{EmbeddingFetcher, FetchOptions, FetchOutcome};
pub use provider::{EmbeddingProvider, HttpEmbeddingProvider};
