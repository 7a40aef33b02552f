//! Streaming category-similarity matcher.
//!
//! Pairs paged target items against paged category items and tracks the
//! best cosine match per target. The full O(|targets| × |categories|)
//! comparison matrix is never materialized: at any instant the matcher
//! holds one target page and one category page of embeddings.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lexsort_embeddings::{EmbeddingFetcher, FetchOptions};
use lexsort_progress::{ProgressEvent, ProgressSink};
use lexsort_types::{
    cosine_similarity, AssignmentResult, EmbeddingSource, EmbeddingStore, Item, ItemKind,
    ItemStore, MatcherSettings,
};

use crate::cursor::PageCursor;
use crate::error::MatchError;

/// Matcher tuning knobs.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Targets resident per page
    pub target_page_size: usize,
    /// Categories resident per page
    pub category_page_size: usize,
    /// Fail instead of calling the provider when embeddings are missing
    pub cache_only: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            target_page_size: 2000,
            category_page_size: 2000,
            cache_only: false,
        }
    }
}

impl From<&MatcherSettings> for MatcherConfig {
    fn from(settings: &MatcherSettings) -> Self {
        Self {
            target_page_size: settings.target_page_size,
            category_page_size: settings.category_page_size,
            cache_only: settings.cache_only,
        }
    }
}

/// Statistics from one matching run.
#[derive(Debug, Default, Clone)]
pub struct MatchStats {
    /// Targets that received an assignment
    pub targets_processed: u64,
    /// Target pages consumed
    pub target_pages: u64,
    /// Category pages scanned (summed over target pages)
    pub category_pages_scanned: u64,
    /// Unique texts fetched from the provider
    pub provider_fetches: u64,
    /// Most embeddings resident at once (target page + category page)
    pub peak_resident_embeddings: usize,
}

/// Running best match for one target.
#[derive(Clone)]
struct BestMatch {
    score: f32,
    category_id: u64,
    category_name: String,
}

/// The streaming matcher. Borrows a job-owned fetcher and item store.
pub struct StreamingCategoryMatcher<'a, S: ItemStore, E: EmbeddingStore> {
    items: &'a S,
    fetcher: &'a EmbeddingFetcher<E>,
    config: MatcherConfig,
    cancel: CancellationToken,
}

impl<'a, S: ItemStore, E: EmbeddingStore> StreamingCategoryMatcher<'a, S, E> {
    pub fn new(items: &'a S, fetcher: &'a EmbeddingFetcher<E>, config: MatcherConfig) -> Self {
        Self {
            items,
            fetcher,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the full match. One [`AssignmentResult`] per target is
    /// emitted on the sink as soon as its page finishes its category
    /// scan; matching progress is reported per target page.
    pub async fn run(
        &self,
        fetch_opts: &FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<MatchStats, MatchError> {
        let total_targets = self.items.count(ItemKind::Target)?;
        let mut stats = MatchStats::default();
        let mut processed = 0u64;

        let fetch_opts = fetch_opts.clone().cache_only(self.config.cache_only);

        let mut target_cursor =
            PageCursor::new(self.items, ItemKind::Target, self.config.target_page_size);

        while let Some(target_page) = target_cursor.next_page()? {
            if self.cancel.is_cancelled() {
                info!("matching cancelled at target page {}", stats.target_pages);
                return Err(MatchError::Cancelled);
            }

            let (target_vectors, target_sources) =
                self.resolve_page(&target_page, ItemKind::Target, &fetch_opts, sink, &mut stats)
                    .await?;

            let mut best: Vec<Option<BestMatch>> = vec![None; target_page.len()];

            // Full scan over all category pages for this target page.
            let mut category_cursor = PageCursor::new(
                self.items,
                ItemKind::Category,
                self.config.category_page_size,
            );
            while let Some(category_page) = category_cursor.next_page()? {
                if self.cancel.is_cancelled() {
                    return Err(MatchError::Cancelled);
                }

                let (category_vectors, _) = self
                    .resolve_page(&category_page, ItemKind::Category, &fetch_opts, sink, &mut stats)
                    .await?;

                let resident = target_page.len() + category_page.len();
                if resident > stats.peak_resident_embeddings {
                    stats.peak_resident_embeddings = resident;
                }

                for (t, target_vector) in target_vectors.iter().enumerate() {
                    for (c, category) in category_page.iter().enumerate() {
                        let score = cosine_similarity(target_vector, &category_vectors[c]);
                        // Strictly greater: equal scores keep the
                        // earlier-found category under cursor order.
                        let replace = match &best[t] {
                            Some(current) => score > current.score,
                            None => true,
                        };
                        if replace {
                            best[t] = Some(BestMatch {
                                score,
                                category_id: category.id,
                                category_name: category.text.clone(),
                            });
                        }
                    }
                }
                stats.category_pages_scanned += 1;
            }

            // Category scan complete: stream this page's results.
            for (t, target) in target_page.iter().enumerate() {
                match best[t].take() {
                    Some(found) => {
                        sink.emit(&ProgressEvent::Assignment(AssignmentResult {
                            item_id: target.id,
                            best_category_id: found.category_id,
                            best_category_name: found.category_name,
                            similarity: found.score,
                            embedding_source: target_sources[t],
                        }));
                        stats.targets_processed += 1;
                    }
                    None => {
                        warn!(item = target.id, "no categories to match against");
                    }
                }
            }

            processed += target_page.len() as u64;
            stats.target_pages += 1;
            sink.emit(&ProgressEvent::match_progress(processed, total_targets));
            debug!(
                page = stats.target_pages,
                processed, total_targets, "target page complete"
            );
        }

        info!(
            targets = stats.targets_processed,
            pages = stats.target_pages,
            fetched = stats.provider_fetches,
            "matching run complete"
        );
        Ok(stats)
    }

    /// Resolve embeddings for one page and flag freshly fetched items as
    /// ready so future runs skip the provider for them.
    async fn resolve_page(
        &self,
        page: &[Item],
        kind: ItemKind,
        fetch_opts: &FetchOptions,
        sink: &dyn ProgressSink,
        stats: &mut MatchStats,
    ) -> Result<(Vec<Vec<f32>>, Vec<EmbeddingSource>), MatchError> {
        let texts: Vec<String> = page.iter().map(|item| item.text.clone()).collect();
        let outcome = self.fetcher.fetch(&texts, fetch_opts, sink).await?;
        stats.provider_fetches += outcome.fetched_count as u64;

        let fresh: Vec<u64> = page
            .iter()
            .zip(outcome.sources.iter())
            .filter(|(item, source)| !item.ready && **source == EmbeddingSource::Provider)
            .map(|(item, _)| item.id)
            .collect();
        if !fresh.is_empty() {
            self.items.mark_ready(kind, &fresh)?;
        }

        Ok((outcome.vectors, outcome.sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lexsort_embeddings::{EmbeddingCache, EmbeddingError, EmbeddingProvider};
    use lexsort_progress::MemorySink;
    use lexsort_types::StoreError;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    /// In-memory item + embedding store for matcher tests.
    #[derive(Default)]
    struct MemoryBackend {
        targets: Mutex<BTreeMap<u64, Item>>,
        categories: Mutex<BTreeMap<u64, Item>>,
        payloads: Mutex<HashMap<(String, String), Vec<u8>>>,
    }

    impl MemoryBackend {
        fn collection(&self, kind: ItemKind) -> &Mutex<BTreeMap<u64, Item>> {
            match kind {
                ItemKind::Target => &self.targets,
                ItemKind::Category => &self.categories,
            }
        }

        fn seed(&self, kind: ItemKind, items: Vec<Item>) {
            let mut map = self.collection(kind).lock().unwrap();
            for item in items {
                map.insert(item.id, item);
            }
        }
    }

    impl ItemStore for MemoryBackend {
        fn page_after(
            &self,
            kind: ItemKind,
            after_id: u64,
            limit: usize,
        ) -> Result<Vec<Item>, StoreError> {
            Ok(self
                .collection(kind)
                .lock()
                .unwrap()
                .range(after_id.saturating_add(1)..)
                .take(limit)
                .map(|(_, item)| item.clone())
                .collect())
        }

        fn count(&self, kind: ItemKind) -> Result<u64, StoreError> {
            Ok(self.collection(kind).lock().unwrap().len() as u64)
        }

        fn mark_ready(&self, kind: ItemKind, ids: &[u64]) -> Result<(), StoreError> {
            let mut map = self.collection(kind).lock().unwrap();
            for id in ids {
                if let Some(item) = map.get_mut(id) {
                    item.ready = true;
                }
            }
            Ok(())
        }
    }

    impl EmbeddingStore for MemoryBackend {
        fn get_payload(&self, model: &str, text: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(self
                .payloads
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
            texts.iter().map(|t| self.get_payload(model, t)).collect()
        }

        fn put_payload(&self, model: &str, text: &str, payload: &[u8]) -> Result<(), StoreError> {
            self.payloads
                .lock()
                .unwrap()
                .insert((model.to_string(), text.to_string()), payload.to_vec());
            Ok(())
        }
    }

    /// Provider with explicit per-text vectors.
    struct TableProvider {
        vectors: HashMap<String, Vec<f32>>,
        calls: Mutex<usize>,
    }

    impl TableProvider {
        fn new(vectors: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vectors: vectors
                    .iter()
                    .map(|(t, v)| (t.to_string(), v.clone()))
                    .collect(),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableProvider {
        async fn embed_batch(
            &self,
            _model: &str,
            texts: &[String],
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            *self.calls.lock().unwrap() += 1;
            Ok(texts
                .iter()
                .map(|t| self.vectors.get(t).cloned().unwrap_or_else(|| vec![0.0; 4]))
                .collect())
        }
    }

    fn opts() -> FetchOptions {
        let mut opts = FetchOptions::new("test-model");
        opts.chunk_delay = std::time::Duration::ZERO;
        opts
    }

    fn assignments(sink: &MemorySink) -> Vec<AssignmentResult> {
        sink.events()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Assignment(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_targets_assigned_to_nearest_category() {
        let backend = Arc::new(MemoryBackend::default());
        backend.seed(
            ItemKind::Category,
            vec![Item::new(1, "animals"), Item::new(2, "tools")],
        );
        backend.seed(
            ItemKind::Target,
            vec![Item::new(1, "wolf"), Item::new(2, "hammer")],
        );

        let provider = Arc::new(TableProvider::new(&[
            ("animals", vec![1.0, 0.0, 0.0, 0.0]),
            ("tools", vec![0.0, 1.0, 0.0, 0.0]),
            ("wolf", vec![0.9, 0.1, 0.0, 0.0]),
            ("hammer", vec![0.1, 0.9, 0.0, 0.0]),
        ]));

        let cache = EmbeddingCache::new(backend.clone());
        let fetcher = EmbeddingFetcher::new(cache, provider);
        let matcher =
            StreamingCategoryMatcher::new(backend.as_ref(), &fetcher, MatcherConfig::default());
        let sink = MemorySink::new();

        let stats = matcher.run(&opts(), &sink).await.unwrap();
        assert_eq!(stats.targets_processed, 2);

        let results = assignments(&sink);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].best_category_name, "animals");
        assert_eq!(results[1].best_category_name, "tools");
        assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.similarity)));
    }

    #[tokio::test]
    async fn test_strictly_greater_replaces_later_category() {
        let backend = Arc::new(MemoryBackend::default());
        // Category A (id 1) scores 0.9, category B (id 2, later) scores 1.0
        backend.seed(
            ItemKind::Category,
            vec![Item::new(1, "cat-a"), Item::new(2, "cat-b")],
        );
        backend.seed(ItemKind::Target, vec![Item::new(1, "target")]);

        let target_vec = vec![1.0, 0.0, 0.0, 0.0];
        // cos(a, target) ≈ 0.9, cos(b, target) = 1.0
        let a = vec![0.9, (1.0f32 - 0.81).sqrt(), 0.0, 0.0];
        let provider = Arc::new(TableProvider::new(&[
            ("target", target_vec.clone()),
            ("cat-a", a),
            ("cat-b", target_vec),
        ]));

        let cache = EmbeddingCache::new(backend.clone());
        let fetcher = EmbeddingFetcher::new(cache, provider);
        let matcher =
            StreamingCategoryMatcher::new(backend.as_ref(), &fetcher, MatcherConfig::default());
        let sink = MemorySink::new();
        matcher.run(&opts(), &sink).await.unwrap();

        let results = assignments(&sink);
        assert_eq!(results[0].best_category_name, "cat-b");
    }

    #[tokio::test]
    async fn test_equal_scores_keep_earlier_category() {
        let backend = Arc::new(MemoryBackend::default());
        backend.seed(
            ItemKind::Category,
            vec![Item::new(1, "first"), Item::new(2, "second")],
        );
        backend.seed(ItemKind::Target, vec![Item::new(1, "target")]);

        let shared = vec![0.5, 0.5, 0.0, 0.0];
        let provider = Arc::new(TableProvider::new(&[
            ("target", shared.clone()),
            ("first", shared.clone()),
            ("second", shared),
        ]));

        let cache = EmbeddingCache::new(backend.clone());
        let fetcher = EmbeddingFetcher::new(cache, provider);
        let matcher =
            StreamingCategoryMatcher::new(backend.as_ref(), &fetcher, MatcherConfig::default());
        let sink = MemorySink::new();
        matcher.run(&opts(), &sink).await.unwrap();

        assert_eq!(assignments(&sink)[0].best_category_name, "first");
    }

    #[tokio::test]
    async fn test_memory_stays_bounded_by_page_sizes() {
        let backend = Arc::new(MemoryBackend::default());
        backend.seed(
            ItemKind::Category,
            (1..=700u64).map(|id| Item::new(id, format!("c{id}"))).collect(),
        );
        backend.seed(
            ItemKind::Target,
            (1..=1200u64).map(|id| Item::new(id, format!("t{id}"))).collect(),
        );

        let provider = Arc::new(TableProvider::new(&[]));
        let cache = EmbeddingCache::new(backend.clone());
        let fetcher = EmbeddingFetcher::new(cache, provider);
        let config = MatcherConfig {
            target_page_size: 500,
            category_page_size: 500,
            cache_only: false,
        };
        let matcher = StreamingCategoryMatcher::new(backend.as_ref(), &fetcher, config);
        let sink = MemorySink::new();

        let stats = matcher.run(&opts(), &sink).await.unwrap();
        assert_eq!(stats.targets_processed, 1200);
        // Never more than one target page plus one category page resident
        assert!(stats.peak_resident_embeddings <= 1000);
        assert_eq!(stats.target_pages, 3);
    }

    #[tokio::test]
    async fn test_fresh_items_marked_ready() {
        let backend = Arc::new(MemoryBackend::default());
        backend.seed(ItemKind::Category, vec![Item::new(1, "cat")]);
        backend.seed(ItemKind::Target, vec![Item::new(1, "tgt")]);

        let provider = Arc::new(TableProvider::new(&[
            ("cat", vec![1.0, 0.0, 0.0, 0.0]),
            ("tgt", vec![1.0, 0.0, 0.0, 0.0]),
        ]));
        let cache = EmbeddingCache::new(backend.clone());
        let fetcher = EmbeddingFetcher::new(cache, provider);
        let matcher =
            StreamingCategoryMatcher::new(backend.as_ref(), &fetcher, MatcherConfig::default());
        let sink = MemorySink::new();
        matcher.run(&opts(), &sink).await.unwrap();

        assert!(backend.targets.lock().unwrap()[&1].ready);
        assert!(backend.categories.lock().unwrap()[&1].ready);
    }

    #[tokio::test]
    async fn test_cancellation_emits_no_results() {
        let backend = Arc::new(MemoryBackend::default());
        backend.seed(ItemKind::Category, vec![Item::new(1, "c")]);
        backend.seed(ItemKind::Target, vec![Item::new(1, "t")]);

        let provider = Arc::new(TableProvider::new(&[]));
        let cache = EmbeddingCache::new(backend.clone());
        let fetcher = EmbeddingFetcher::new(cache, provider);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let matcher =
            StreamingCategoryMatcher::new(backend.as_ref(), &fetcher, MatcherConfig::default())
                .with_cancellation(cancel);
        let sink = MemorySink::new();

        assert!(matches!(
            matcher.run(&opts(), &sink).await,
            Err(MatchError::Cancelled)
        ));
        assert!(assignments(&sink).is_empty());
    }

    #[tokio::test]
    async fn test_no_categories_completes_without_results() {
        let backend = Arc::new(MemoryBackend::default());
        backend.seed(ItemKind::Target, vec![Item::new(1, "t")]);

        let provider = Arc::new(TableProvider::new(&[]));
        let cache = EmbeddingCache::new(backend.clone());
        let fetcher = EmbeddingFetcher::new(cache, provider);
        let matcher =
            StreamingCategoryMatcher::new(backend.as_ref(), &fetcher, MatcherConfig::default());
        let sink = MemorySink::new();

        let stats = matcher.run(&opts(), &sink).await.unwrap();
        assert_eq!(stats.targets_processed, 0);
        assert!(assignments(&sink).is_empty());
    }
}
