//! Batched, rate-aware embedding fetcher.
//!
//! One `fetch` call resolves a slice of texts to vectors:
//! - identical strings are deduplicated across the whole call, so a
//!   text repeated N times costs one cache lookup and one provider
//!   slot, with all N output positions sharing the vector
//! - cache misses are split into chunks and sent to the provider one
//!   chunk at a time, never in parallel, with a configurable delay
//!   between chunks to respect rate limits
//! - every fetched vector is written through to the cache before the
//!   call returns; a provider error aborts the whole call, but writes
//!   committed for earlier chunks persist and speed up a retry
//! - outputs are returned in input order regardless of dedup/chunking

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use lexsort_progress::{ProgressEvent, ProgressSink};
use lexsort_types::{EmbeddingSource, EmbeddingStore, ProviderSettings};

use crate::cache::EmbeddingCache;
use crate::error::EmbeddingError;
use crate::provider::EmbeddingProvider;

/// Default texts per provider call.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Default delay between provider calls.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(50);

/// Options for one fetch call.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Embedding model name; part of the cache identity key
    pub model: String,
    /// Maximum texts per provider call
    pub chunk_size: usize,
    /// Delay inserted between consecutive provider calls
    pub chunk_delay: Duration,
    /// Fail instead of calling the provider on any cache miss
    pub cache_only: bool,
}

impl FetchOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            cache_only: false,
        }
    }

    /// Derive options from provider settings.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self {
            model: settings.model.clone(),
            chunk_size: settings.chunk_size,
            chunk_delay: Duration::from_millis(settings.chunk_delay_ms),
            cache_only: false,
        }
    }

    pub fn cache_only(mut self, cache_only: bool) -> Self {
        self.cache_only = cache_only;
        self
    }
}

/// Result of one fetch call, aligned with the input slice.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// One vector per input position
    pub vectors: Vec<Vec<f32>>,
    /// Where each position's vector came from
    pub sources: Vec<EmbeddingSource>,
    /// Unique texts that had to be fetched from the provider
    pub fetched_count: usize,
}

/// Dedups and chunks text batches against the cache and provider.
pub struct EmbeddingFetcher<S: EmbeddingStore> {
    cache: EmbeddingCache<S>,
    provider: Arc<dyn EmbeddingProvider>,
    cancel: CancellationToken,
}

impl<S: EmbeddingStore> EmbeddingFetcher<S> {
    pub fn new(cache: EmbeddingCache<S>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            cache,
            provider,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Borrow the underlying cache.
    pub fn cache(&self) -> &EmbeddingCache<S> {
        &self.cache
    }

    /// Resolve `texts` to vectors, in input order.
    ///
    /// Progress is reported after each provider chunk as
    /// {fetched, total} over the unique texts requiring fetch.
    pub async fn fetch(
        &self,
        texts: &[String],
        opts: &FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutcome, EmbeddingError> {
        if texts.is_empty() {
            return Ok(FetchOutcome {
                vectors: Vec::new(),
                sources: Vec::new(),
                fetched_count: 0,
            });
        }
        if opts.chunk_size == 0 {
            return Err(EmbeddingError::InvalidInput(
                "chunk_size must be > 0".to_string(),
            ));
        }

        // Dedup across the whole call, preserving first-seen order.
        let mut unique: Vec<&str> = Vec::new();
        let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(texts.len());
        for text in texts {
            if !index_of.contains_key(text.as_str()) {
                index_of.insert(text.as_str(), unique.len());
                unique.push(text.as_str());
            }
        }

        let cached = self.cache.get_bulk(&unique, &opts.model)?;

        // One slot per unique text, filled from cache then provider.
        let mut resolved: Vec<Option<(Vec<f32>, EmbeddingSource)>> = vec![None; unique.len()];
        let mut missing: Vec<String> = Vec::new();
        for (i, &text) in unique.iter().enumerate() {
            match cached.get(text) {
                Some(vector) => resolved[i] = Some((vector.clone(), EmbeddingSource::Cache)),
                None => missing.push(text.to_string()),
            }
        }

        if opts.cache_only && !missing.is_empty() {
            return Err(EmbeddingError::CacheOnlyMiss { missing });
        }

        let total_missing = missing.len();
        let mut fetched = 0usize;
        for (chunk_index, chunk) in missing.chunks(opts.chunk_size).enumerate() {
            if self.cancel.is_cancelled() {
                info!("fetch cancelled before chunk {}", chunk_index);
                return Err(EmbeddingError::Cancelled);
            }
            if chunk_index > 0 && !opts.chunk_delay.is_zero() {
                tokio::time::sleep(opts.chunk_delay).await;
            }

            let vectors = self.provider.embed_batch(&opts.model, chunk).await?;

            // Write-through before reporting the chunk as done.
            for (text, vector) in chunk.iter().zip(vectors.iter()) {
                self.cache.put(text, vector, &opts.model)?;
                let slot = index_of[text.as_str()];
                resolved[slot] = Some((vector.clone(), EmbeddingSource::Provider));
            }

            fetched += chunk.len();
            sink.emit(&ProgressEvent::fetch_progress(
                fetched as u64,
                total_missing as u64,
            ));
            debug!(
                chunk = chunk_index,
                fetched,
                total = total_missing,
                "provider chunk complete"
            );
        }

        // Expand unique slots back to input order.
        let mut vectors = Vec::with_capacity(texts.len());
        let mut sources = Vec::with_capacity(texts.len());
        for text in texts {
            let (vector, source) = resolved[index_of[text.as_str()]]
                .as_ref()
                .expect("every unique slot is resolved by cache or provider");
            vectors.push(vector.clone());
            sources.push(*source);
        }

        Ok(FetchOutcome {
            vectors,
            sources,
            fetched_count: total_missing,
        })
    }
}
