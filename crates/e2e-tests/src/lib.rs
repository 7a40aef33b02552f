//! End-to-end test infrastructure for lexsort.
//!
//! Provides a shared TestHarness (temp-dir RocksDB plus a tuned-down
//! config) and a scripted embedding provider for tests covering the
//! full seed-to-assignment and train-to-predict pipelines.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lexsort_embeddings::{EmbeddingError, EmbeddingProvider};
use lexsort_storage::Database;
use lexsort_types::{EngineConfig, Item, ItemKind};

/// Embedding dimension used by every scripted vector.
pub const DIM: usize = 8;

/// Shared test harness for E2E tests.
///
/// Owns the temp directory, an open database, and a config tuned for
/// tests: zero inter-chunk delay, small chunks and pages so paging and
/// chunking paths are exercised with tiny datasets.
pub struct TestHarness {
    /// Keeps the temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub db: Arc<Database>,
    pub config: EngineConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("db");
        let db = Arc::new(Database::open(&db_path).expect("Failed to open test database"));

        let mut config = EngineConfig::default();
        config.db_path = db_path;
        config.provider.model = "scripted-embed".to_string();
        config.provider.chunk_size = 4;
        config.provider.chunk_delay_ms = 0;
        config.matcher.target_page_size = 3;
        config.matcher.category_page_size = 3;
        config.training.epochs = 50;

        Self {
            _temp_dir: temp_dir,
            db,
            config,
        }
    }

    /// Store items of one kind, ids assigned from `start_id` upward.
    pub fn seed_items(&self, kind: ItemKind, start_id: u64, texts: &[&str]) -> Vec<Item> {
        let items: Vec<Item> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Item::new(start_id + i as u64, *text))
            .collect();
        self.db.put_items(kind, &items).expect("Failed to seed items");
        items
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A basis-aligned vector: 1.0 on `axis`, zero elsewhere.
pub fn axis_vector(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[axis % DIM] = 1.0;
    v
}

/// Deterministic vector for texts with no scripted entry (FNV-1a over
/// the text picks the dominant axis).
pub fn derived_vector(text: &str) -> Vec<f32> {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    let mut v = vec![0.0f32; DIM];
    v[(hash as usize) % DIM] = 1.0;
    v[((hash >> 8) as usize) % DIM] += 0.25;
    v
}

/// Deterministic mock provider. Serves scripted vectors per text and
/// derived vectors otherwise; counts batches and can be told to fail
/// after the first N batches.
pub struct ScriptedProvider {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    batches: AtomicUsize,
    texts_served: AtomicUsize,
    fail_after_batches: Option<usize>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            vectors: Mutex::new(HashMap::new()),
            batches: AtomicUsize::new(0),
            texts_served: AtomicUsize::new(0),
            fail_after_batches: None,
        }
    }

    /// Every batch after the first `batches` fails with a transport error.
    pub fn failing_after(batches: usize) -> Self {
        Self {
            fail_after_batches: Some(batches),
            ..Self::new()
        }
    }

    /// Pin the vector served for one text.
    pub fn script(&self, text: &str, vector: Vec<f32>) {
        self.vectors
            .lock()
            .unwrap()
            .insert(text.to_string(), vector);
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn texts_served(&self) -> usize {
        self.texts_served.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed_batch(
        &self,
        _model: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let batch = self.batches.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after_batches {
            if batch >= limit {
                return Err(EmbeddingError::ProviderTransport {
                    message: "scripted transport failure".to_string(),
                });
            }
        }
        self.texts_served.fetch_add(texts.len(), Ordering::SeqCst);

        let scripted = self.vectors.lock().unwrap();
        Ok(texts
            .iter()
            .map(|text| {
                scripted
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| derived_vector(text))
            })
            .collect())
    }
}
