//! Train-or-reuse entry point.
//!
//! Retraining is expensive (provider calls + epochs), so a persisted
//! model is reused when it is provably still valid: its version tag
//! matches the current trainer and every sample's embedding is already
//! cached at the model's dimension. Anything else retrains from freshly
//! synchronized embeddings and persists the result.

use tracing::info;

use lexsort_embeddings::{EmbeddingError, EmbeddingFetcher, FetchOptions};
use lexsort_progress::ProgressSink;
use lexsort_types::{ClassifierModel, EmbeddingStore, LabeledSample, ModelStore};

use crate::error::ClassifyError;
use crate::persist::{from_persisted, save_model};
use crate::trainer::{train, TrainOptions, TrainingSample, MODEL_VERSION_TAG};

/// Outcome of a training session.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub model: ClassifierModel,
    /// True when the persisted model was returned unchanged, with zero
    /// provider calls and zero training epochs
    pub reused: bool,
    /// Samples the model was trained on (0 when reused)
    pub trained_samples: usize,
}

/// Train a classifier for `owner`, reusing the persisted model when the
/// reuse preconditions hold.
pub async fn train_or_reuse<S: EmbeddingStore, M: ModelStore>(
    model_store: &M,
    fetcher: &EmbeddingFetcher<S>,
    owner: &str,
    model_name: &str,
    samples: &[LabeledSample],
    opts: &TrainOptions,
    fetch_opts: &FetchOptions,
    sink: &dyn ProgressSink,
) -> Result<TrainReport, ClassifyError> {
    if samples.is_empty() {
        return Err(ClassifyError::EmptyTrainingSet);
    }
    let texts: Vec<String> = samples.iter().map(|s| s.text.clone()).collect();

    if let Some(persisted) = model_store.get_model(owner)? {
        if persisted.vector_model_tag == MODEL_VERSION_TAG {
            match try_reuse(fetcher, &persisted, &texts, fetch_opts, sink).await? {
                Some(model) => {
                    info!(owner, "reusing persisted classifier model");
                    return Ok(TrainReport {
                        model,
                        reused: true,
                        trained_samples: 0,
                    });
                }
                None => {
                    info!(owner, "persisted model unusable, retraining");
                }
            }
        } else {
            info!(
                owner,
                persisted_tag = %persisted.vector_model_tag,
                current_tag = MODEL_VERSION_TAG,
                "version tag mismatch, retraining"
            );
        }
    }

    // Retrain with freshly synchronized embeddings.
    let outcome = fetcher.fetch(&texts, fetch_opts, sink).await?;
    let training_samples: Vec<TrainingSample> = samples
        .iter()
        .zip(outcome.vectors)
        .map(|(sample, embedding)| TrainingSample {
            label: sample.label.clone(),
            embedding,
        })
        .collect();

    let model = train(&training_samples, opts, sink)?;
    save_model(model_store, owner, &model, model_name)?;

    Ok(TrainReport {
        model,
        reused: false,
        trained_samples: training_samples.len(),
    })
}

/// Check the reuse preconditions against the cache. Returns the decoded
/// model when every sample embedding is cached at the model dimension.
async fn try_reuse<S: EmbeddingStore>(
    fetcher: &EmbeddingFetcher<S>,
    persisted: &lexsort_types::PersistedModel,
    texts: &[String],
    fetch_opts: &FetchOptions,
    sink: &dyn ProgressSink,
) -> Result<Option<ClassifierModel>, ClassifyError> {
    let model = from_persisted(persisted)?;

    let cache_probe = fetch_opts.clone().cache_only(true);
    let outcome = match fetcher.fetch(texts, &cache_probe, sink).await {
        Ok(outcome) => outcome,
        Err(EmbeddingError::CacheOnlyMiss { missing }) => {
            info!(missing = missing.len(), "sample embeddings not fully cached");
            return Ok(None);
        }
        Err(other) => return Err(other.into()),
    };

    if outcome
        .vectors
        .iter()
        .any(|vector| vector.len() != model.dimension)
    {
        info!("cached embeddings disagree with model dimension");
        return Ok(None);
    }

    Ok(Some(model))
}
