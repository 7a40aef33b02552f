//! Persistent write-through embedding cache.
//!
//! Content-addressed store mapping (text, model) to a vector. The cache
//! is a job-owned value over an [`EmbeddingStore`] implementation; it
//! holds no global state, so isolated tests and concurrent jobs on
//! separate stores are safe.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use lexsort_types::{CachedEmbeddingEntry, EmbeddingStore};

use crate::encoding;
use crate::error::EmbeddingError;

/// Maximum keys per backing-store sub-query. Bulk lookups are split to
/// stay under backing-store parameter limits.
pub const MAX_KEYS_PER_QUERY: usize = 1000;

/// Write-through cache over a backing [`EmbeddingStore`].
pub struct EmbeddingCache<S: EmbeddingStore> {
    store: Arc<S>,
}

impl<S: EmbeddingStore> EmbeddingCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Look up one vector.
    pub fn get(&self, text: &str, model: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        match self.store.get_payload(model, text)? {
            Some(raw) => Ok(Some(encoding::decode(&raw)?.values)),
            None => Ok(None),
        }
    }

    /// Look up one full entry, including its write timestamp.
    pub fn get_entry(
        &self,
        text: &str,
        model: &str,
    ) -> Result<Option<CachedEmbeddingEntry>, EmbeddingError> {
        match self.store.get_payload(model, text)? {
            Some(raw) => {
                let decoded = encoding::decode(&raw)?;
                Ok(Some(CachedEmbeddingEntry {
                    text: text.to_string(),
                    model_name: model.to_string(),
                    vector: decoded.values,
                    inserted_at: decoded.inserted_at,
                }))
            }
            None => Ok(None),
        }
    }

    /// Bulk lookup. Input is deduplicated, then split into sub-queries
    /// of at most [`MAX_KEYS_PER_QUERY`] keys. The returned map holds
    /// only the texts that were found.
    pub fn get_bulk(
        &self,
        texts: &[&str],
        model: &str,
    ) -> Result<HashMap<String, Vec<f32>>, EmbeddingError> {
        let mut unique: Vec<&str> = Vec::with_capacity(texts.len());
        let mut seen: HashMap<&str, ()> = HashMap::with_capacity(texts.len());
        for &text in texts {
            if seen.insert(text, ()).is_none() {
                unique.push(text);
            }
        }

        let mut found = HashMap::with_capacity(unique.len());
        for chunk in unique.chunks(MAX_KEYS_PER_QUERY) {
            let payloads = self.store.multi_get_payload(model, chunk)?;
            for (&text, payload) in chunk.iter().zip(payloads) {
                if let Some(raw) = payload {
                    let decoded = encoding::decode(&raw)?;
                    found.insert(text.to_string(), decoded.values);
                }
            }
        }
        debug!(
            requested = texts.len(),
            unique = unique.len(),
            found = found.len(),
            model,
            "bulk cache lookup"
        );
        Ok(found)
    }

    /// Idempotent overwrite of one vector.
    ///
    /// Encodes binary; if that fails, the entry is written in the
    /// textual fallback encoding instead of being lost.
    pub fn put(&self, text: &str, vector: &[f32], model: &str) -> Result<(), EmbeddingError> {
        let payload = match encoding::encode(vector, Utc::now()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(text, model, "binary encode failed ({e}), using textual fallback");
                encoding::encode_legacy(vector)
            }
        };
        self.store.put_payload(model, text, &payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryStore;
    use lexsort_types::EmbeddingStore as _;

    fn cache() -> EmbeddingCache<MemoryStore> {
        EmbeddingCache::new(Arc::new(MemoryStore::default()))
    }

    #[test]
    fn test_put_twice_then_get_is_bit_for_bit() {
        let cache = cache();
        let vector = vec![0.1f32, -0.2, 0.3];
        cache.put("apple", &vector, "m").unwrap();
        cache.put("apple", &vector, "m").unwrap();

        let got = cache.get("apple", "m").unwrap().unwrap();
        for (a, b) in vector.iter().zip(got.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_miss_is_none_not_error() {
        assert!(cache().get("nothing", "m").unwrap().is_none());
    }

    #[test]
    fn test_bulk_split_into_bounded_subqueries() {
        let cache = cache();
        let texts: Vec<String> = (0..2500).map(|i| format!("text-{i}")).collect();
        for text in &texts {
            cache.put(text, &[1.0, 2.0], "m").unwrap();
        }
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let found = cache.get_bulk(&refs, "m").unwrap();
        assert_eq!(found.len(), 2500);

        let queries = cache.store.queries.lock().unwrap().clone();
        assert_eq!(queries, vec![1000, 1000, 500]);
    }

    #[test]
    fn test_bulk_dedups_input() {
        let cache = cache();
        cache.put("a", &[1.0], "m").unwrap();
        let found = cache.get_bulk(&["a", "a", "a", "b"], "m").unwrap();
        assert_eq!(found.len(), 1);
        let queries = cache.store.queries.lock().unwrap().clone();
        assert_eq!(queries, vec![2]);
    }

    #[test]
    fn test_legacy_payload_readable_and_rewritten_binary() {
        let cache = cache();
        // Simulate a pre-migration entry
        cache
            .store
            .put_payload("m", "old", b"[1.0,2.0]")
            .unwrap();
        let entry = cache.get_entry("old", "m").unwrap().unwrap();
        assert_eq!(entry.vector, vec![1.0, 2.0]);
        assert!(entry.inserted_at.is_none());

        // An explicit put replaces it with the binary layout
        cache.put("old", &entry.vector, "m").unwrap();
        let rewritten = cache.get_entry("old", "m").unwrap().unwrap();
        assert!(rewritten.inserted_at.is_some());
    }
}
