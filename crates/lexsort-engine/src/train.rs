//! The train job: train or reuse the owner's classifier model.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use lexsort_classify::{train_or_reuse, TrainOptions, TrainReport};
use lexsort_embeddings::{EmbeddingCache, EmbeddingFetcher, EmbeddingProvider, FetchOptions};
use lexsort_progress::ProgressSink;
use lexsort_storage::Database;
use lexsort_types::{EngineConfig, LabeledSample};

use crate::error::EngineError;

/// Trains (or reuses) the softmax classifier for one owner and
/// persists the result.
pub struct TrainJob {
    db: Arc<Database>,
    provider: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
    owner: String,
    model_name: String,
    cancel: CancellationToken,
}

impl TrainJob {
    pub fn new(
        db: Arc<Database>,
        provider: Arc<dyn EmbeddingProvider>,
        config: &EngineConfig,
        owner: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            db,
            provider,
            config: config.clone(),
            owner: owner.into(),
            model_name: model_name.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(
        &self,
        samples: &[LabeledSample],
        sink: &dyn ProgressSink,
    ) -> Result<TrainReport, EngineError> {
        let cache = EmbeddingCache::new(self.db.clone());
        let fetcher = EmbeddingFetcher::new(cache, self.provider.clone())
            .with_cancellation(self.cancel.clone());

        let opts = TrainOptions::from(&self.config.training);
        let fetch_opts = FetchOptions::from_settings(&self.config.provider);

        let report = train_or_reuse(
            self.db.as_ref(),
            &fetcher,
            &self.owner,
            &self.model_name,
            samples,
            &opts,
            &fetch_opts,
            sink,
        )
        .await?;

        info!(
            owner = %self.owner,
            reused = report.reused,
            labels = report.model.labels.len(),
            "train job finished"
        );
        Ok(report)
    }
}
