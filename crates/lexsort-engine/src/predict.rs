//! One-shot prediction against the owner's persisted model.

use std::sync::Arc;

use lexsort_classify::{load_model, predict_text, Prediction};
use lexsort_embeddings::{EmbeddingCache, EmbeddingFetcher, EmbeddingProvider, FetchOptions};
use lexsort_progress::ProgressSink;
use lexsort_storage::Database;
use lexsort_types::EngineConfig;

use crate::error::EngineError;

/// Classify a single text with the owner's persisted model. The text's
/// embedding resolves cache-first, falling back to the provider.
pub async fn predict_one(
    db: Arc<Database>,
    provider: Arc<dyn EmbeddingProvider>,
    config: &EngineConfig,
    owner: &str,
    text: &str,
    sink: &dyn ProgressSink,
) -> Result<Prediction, EngineError> {
    let model = load_model(db.as_ref(), owner)?
        .ok_or_else(|| EngineError::ModelNotFound(owner.to_string()))?;

    let cache = EmbeddingCache::new(db);
    let fetcher = EmbeddingFetcher::new(cache, provider);
    let fetch_opts = FetchOptions::from_settings(&config.provider);

    Ok(predict_text(&model, &fetcher, text, &fetch_opts, sink).await?)
}
