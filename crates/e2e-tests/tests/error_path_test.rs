//! Failure-path behavior: aborted fetches, cache-only misses, and
//! cooperative cancellation.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use e2e_tests::{ScriptedProvider, TestHarness};
use lexsort_embeddings::EmbeddingError;
use lexsort_engine::{CategorizeJob, EngineError};
use lexsort_match::MatchError;
use lexsort_progress::MemorySink;
use lexsort_types::ItemKind;

#[tokio::test]
async fn test_provider_failure_aborts_but_committed_cache_writes_survive() {
    let harness = TestHarness::new();
    // Chunk size is 4: the target-page chunk succeeds, the category
    // chunk that follows fails.
    let provider = Arc::new(ScriptedProvider::failing_after(1));

    harness.seed_items(ItemKind::Target, 1, &["t-one", "t-two"]);
    harness.seed_items(ItemKind::Category, 1, &["c-one", "c-two", "c-three"]);

    let job = CategorizeJob::new(harness.db.clone(), provider, &harness.config);
    let err = job.run(&MemorySink::new()).await.unwrap_err();
    assert_eq!(err.code(), "provider_transport");

    // The successful chunk's write-through cache entries persist.
    let model = &harness.config.provider.model;
    for text in ["t-one", "t-two"] {
        assert!(
            harness.db.get_embedding(model, text).unwrap().is_some(),
            "{text} should be cached from the committed chunk"
        );
    }
    assert!(harness.db.get_embedding(model, "c-one").unwrap().is_none());
}

#[tokio::test]
async fn test_cache_only_miss_names_the_missing_texts() {
    let harness = TestHarness::new();
    let provider = Arc::new(ScriptedProvider::new());

    harness.seed_items(ItemKind::Target, 1, &["uncached"]);
    harness.seed_items(ItemKind::Category, 1, &["also-uncached"]);

    let mut config = harness.config.clone();
    config.matcher.cache_only = true;

    let job = CategorizeJob::new(harness.db.clone(), provider.clone(), &config);
    let err = job.run(&MemorySink::new()).await.unwrap_err();

    assert_eq!(err.code(), "cache_only_miss");
    match err {
        EngineError::Match(MatchError::Embedding(EmbeddingError::CacheOnlyMiss { missing })) => {
            assert_eq!(missing, vec!["uncached".to_string()]);
        }
        other => panic!("expected cache-only miss, got {other:?}"),
    }
    // Fail-fast: the provider was never consulted.
    assert_eq!(provider.batches(), 0);
}

#[tokio::test]
async fn test_pre_cancelled_job_stops_before_any_work() {
    let harness = TestHarness::new();
    let provider = Arc::new(ScriptedProvider::new());

    harness.seed_items(ItemKind::Target, 1, &["t"]);
    harness.seed_items(ItemKind::Category, 1, &["c"]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let job = CategorizeJob::new(harness.db.clone(), provider.clone(), &harness.config)
        .with_cancellation(cancel);
    let err = job.run(&MemorySink::new()).await.unwrap_err();

    assert_eq!(err.code(), "cancelled");
    assert_eq!(provider.batches(), 0);
}
