//! The categorize job: assign every target item to its best category.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use lexsort_embeddings::{EmbeddingCache, EmbeddingFetcher, EmbeddingProvider, FetchOptions};
use lexsort_match::{MatchStats, MatcherConfig, StreamingCategoryMatcher};
use lexsort_progress::ProgressSink;
use lexsort_storage::Database;
use lexsort_types::{EngineConfig, ItemKind};

use crate::error::EngineError;
use crate::input::read_items;

/// Wires the item store, embedding fetcher, and streaming matcher into
/// one run. Assignment records stream on the sink as pages complete;
/// cache writes and ready flags committed before a failure survive for
/// the next run.
pub struct CategorizeJob {
    db: Arc<Database>,
    provider: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
    cancel: CancellationToken,
}

impl CategorizeJob {
    pub fn new(
        db: Arc<Database>,
        provider: Arc<dyn EmbeddingProvider>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            db,
            provider,
            config: config.clone(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Import items from an NDJSON file before matching.
    pub fn seed_from_file(&self, kind: ItemKind, path: &Path) -> Result<u64, EngineError> {
        let items = read_items(path)?;
        self.db.put_items(kind, &items)?;
        info!(count = items.len(), kind = %kind, "seeded items");
        Ok(items.len() as u64)
    }

    /// Run the match over everything currently in the item store.
    pub async fn run(&self, sink: &dyn ProgressSink) -> Result<MatchStats, EngineError> {
        let cache = EmbeddingCache::new(self.db.clone());
        let fetcher = EmbeddingFetcher::new(cache, self.provider.clone())
            .with_cancellation(self.cancel.clone());

        let matcher = StreamingCategoryMatcher::new(
            self.db.as_ref(),
            &fetcher,
            MatcherConfig::from(&self.config.matcher),
        )
        .with_cancellation(self.cancel.clone());

        let fetch_opts = FetchOptions::from_settings(&self.config.provider);
        let stats = matcher.run(&fetch_opts, sink).await?;
        info!(
            targets = stats.targets_processed,
            provider_fetches = stats.provider_fetches,
            "categorize job finished"
        );
        Ok(stats)
    }
}
