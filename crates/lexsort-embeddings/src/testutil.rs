//! Shared in-memory fakes for this crate's tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use lexsort_types::{EmbeddingStore, StoreError};

use crate::error::EmbeddingError;
use crate::provider::EmbeddingProvider;

/// Minimal in-memory [`EmbeddingStore`], recording multi-get sizes.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
    pub queries: Mutex<Vec<usize>>,
}

impl EmbeddingStore for MemoryStore {
    fn get_payload(&self, model: &str, text: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&(model.to_string(), text.to_string()))
            .cloned())
    }

    fn multi_get_payload(
        &self,
        model: &str,
        texts: &[&str],
    ) -> Result<Vec<Option<Vec<u8>>>, StoreError> {
        self.queries.lock().unwrap().push(texts.len());
        texts
            .iter()
            .map(|text| self.get_payload(model, text))
            .collect()
    }

    fn put_payload(&self, model: &str, text: &str, payload: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert((model.to_string(), text.to_string()), payload.to_vec());
        Ok(())
    }
}

/// Deterministic provider: each text embeds to a vector derived from its
/// bytes. Records every batch it serves; can be armed to fail.
#[derive(Default)]
pub(crate) struct MockProvider {
    pub batches: Mutex<Vec<Vec<String>>>,
    pub fail_after_batches: Mutex<Option<usize>>,
}

impl MockProvider {
    pub fn vector_for(text: &str, dimension: usize) -> Vec<f32> {
        let mut vector = vec![0.0f32; dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % dimension] += byte as f32 / 255.0;
        }
        vector
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn served_texts(&self) -> Vec<String> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    async fn embed_batch(
        &self,
        _model: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut batches = self.batches.lock().unwrap();
        if let Some(limit) = *self.fail_after_batches.lock().unwrap() {
            if batches.len() >= limit {
                return Err(EmbeddingError::ProviderTransport {
                    message: "mock provider armed to fail".to_string(),
                });
            }
        }
        batches.push(texts.to_vec());
        Ok(texts.iter().map(|t| Self::vector_for(t, 8)).collect())
    }
}
