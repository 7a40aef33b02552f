//! Prediction over a trained model.

use serde::Serialize;

use lexsort_embeddings::{EmbeddingFetcher, FetchOptions};
use lexsort_progress::ProgressSink;
use lexsort_types::{ClassifierModel, EmbeddingStore};

use crate::error::ClassifyError;
use crate::math::{argmax, l2_normalize, logits, stable_softmax};

/// A classification outcome: the arg-max label plus the full
/// distributions, so callers can apply their own confidence threshold.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub label: String,
    pub label_index: usize,
    /// Probability of the winning label
    pub score: f32,
    /// One probability per label, aligned with `model.labels`
    pub probabilities: Vec<f32>,
    /// Raw per-label scores before softmax
    pub logits: Vec<f32>,
}

/// Classify a raw embedding vector.
///
/// The input is normalized exactly as during training, scored with the
/// same stable softmax, and must match the model dimension.
pub fn predict_vector(
    model: &ClassifierModel,
    vector: &[f32],
) -> Result<Prediction, ClassifyError> {
    model.validate().map_err(ClassifyError::Model)?;
    if vector.len() != model.dimension {
        return Err(ClassifyError::DimensionMismatch {
            expected: model.dimension,
            actual: vector.len(),
        });
    }

    let x = l2_normalize(vector);
    let scores = logits(&model.weights, &model.bias, &x);
    let probabilities = stable_softmax(&scores);
    let label_index = argmax(&probabilities);

    Ok(Prediction {
        label: model.labels[label_index].clone(),
        label_index,
        score: probabilities[label_index],
        probabilities,
        logits: scores,
    })
}

/// Classify a text: resolves its embedding via the fetcher (cache
/// first, provider on miss), then scores it.
pub async fn predict_text<S: EmbeddingStore>(
    model: &ClassifierModel,
    fetcher: &EmbeddingFetcher<S>,
    text: &str,
    fetch_opts: &FetchOptions,
    sink: &dyn ProgressSink,
) -> Result<Prediction, ClassifyError> {
    let outcome = fetcher
        .fetch(&[text.to_string()], fetch_opts, sink)
        .await?;
    predict_vector(model, &outcome.vectors[0])
}
