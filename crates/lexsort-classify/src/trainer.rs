//! Mini-batch SGD trainer for the softmax classifier.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use lexsort_progress::{ProgressEvent, ProgressSink};
use lexsort_types::{ClassifierModel, TrainingSettings};

use crate::error::ClassifyError;
use crate::math::{l2_normalize, logits, stable_softmax};

/// Version tag written into every trained model. Bump when the training
/// procedure changes incompatibly; persisted models with a different
/// tag are retrained rather than reused.
pub const MODEL_VERSION_TAG: &str = "lexsort-softmax-v1";

/// One sample ready for training: a label and its embedding.
#[derive(Debug, Clone)]
pub struct TrainingSample {
    pub label: String,
    pub embedding: Vec<f32>,
}

/// Training hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f32,
    pub batch_size: usize,
    /// L2 weight-decay coefficient
    pub l2_reg: f32,
    /// Fixed shuffle seed for reproducible runs; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.1,
            batch_size: 32,
            l2_reg: 1e-4,
            seed: None,
        }
    }
}

impl From<&TrainingSettings> for TrainOptions {
    fn from(settings: &TrainingSettings) -> Self {
        Self {
            epochs: settings.epochs,
            learning_rate: settings.learning_rate,
            batch_size: settings.batch_size,
            l2_reg: settings.l2_reg,
            seed: None,
        }
    }
}

/// Train a multiclass softmax model.
///
/// Preconditions: at least one sample, every embedding of uniform
/// dimension with all-finite values. Embeddings are L2-normalized
/// before training. The label vocabulary is built in first-seen order;
/// per-epoch progress is reported on the sink.
pub fn train(
    samples: &[TrainingSample],
    opts: &TrainOptions,
    sink: &dyn ProgressSink,
) -> Result<ClassifierModel, ClassifyError> {
    if samples.is_empty() {
        return Err(ClassifyError::EmptyTrainingSet);
    }
    if opts.batch_size == 0 || opts.epochs == 0 {
        return Err(ClassifyError::Model(
            "epochs and batch_size must be > 0".to_string(),
        ));
    }

    let dimension = samples[0].embedding.len();
    for (index, sample) in samples.iter().enumerate() {
        if sample.embedding.len() != dimension {
            return Err(ClassifyError::InvalidEmbeddingDimension {
                index,
                expected: dimension,
                actual: sample.embedding.len(),
            });
        }
        if !sample.embedding.iter().all(|v| v.is_finite()) {
            return Err(ClassifyError::NonFiniteEmbedding { index });
        }
    }

    // Label vocabulary in first-seen order.
    let mut labels: Vec<String> = Vec::new();
    let mut label_index: HashMap<&str, usize> = HashMap::new();
    let mut targets: Vec<usize> = Vec::with_capacity(samples.len());
    for sample in samples {
        let k = *label_index.entry(sample.label.as_str()).or_insert_with(|| {
            labels.push(sample.label.clone());
            labels.len() - 1
        });
        targets.push(k);
    }
    let num_labels = labels.len();

    let inputs: Vec<Vec<f32>> = samples
        .iter()
        .map(|s| l2_normalize(&s.embedding))
        .collect();

    info!(
        samples = samples.len(),
        labels = num_labels,
        dimension,
        epochs = opts.epochs,
        "training classifier"
    );

    let mut weights = vec![vec![0.0f32; dimension]; num_labels];
    let mut bias = vec![0.0f32; num_labels];

    let mut rng: StdRng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut order: Vec<usize> = (0..samples.len()).collect();

    let mut grad_w = vec![vec![0.0f32; dimension]; num_labels];
    let mut grad_b = vec![0.0f32; num_labels];

    for epoch in 0..opts.epochs {
        order.shuffle(&mut rng);

        for batch in order.chunks(opts.batch_size) {
            for row in grad_w.iter_mut() {
                row.iter_mut().for_each(|g| *g = 0.0);
            }
            grad_b.iter_mut().for_each(|g| *g = 0.0);

            for &i in batch {
                let x = &inputs[i];
                let scores = logits(&weights, &bias, x);
                let probs = stable_softmax(&scores);
                for k in 0..num_labels {
                    // prob − one_hot(label)
                    let err = probs[k] - if k == targets[i] { 1.0 } else { 0.0 };
                    grad_b[k] += err;
                    let row = &mut grad_w[k];
                    for (g, v) in row.iter_mut().zip(x.iter()) {
                        *g += err * v;
                    }
                }
            }

            let scale = opts.learning_rate / batch.len() as f32;
            for k in 0..num_labels {
                for d in 0..dimension {
                    weights[k][d] -=
                        scale * grad_w[k][d] + opts.learning_rate * opts.l2_reg * weights[k][d];
                }
                bias[k] -= scale * grad_b[k];
            }
        }

        sink.emit(&ProgressEvent::epoch_progress(
            (epoch + 1) as u64,
            opts.epochs as u64,
        ));
        if (epoch + 1) % 100 == 0 {
            debug!(epoch = epoch + 1, total = opts.epochs, "training progress");
        }
    }

    let model = ClassifierModel {
        weights,
        bias,
        labels,
        dimension,
        version_tag: MODEL_VERSION_TAG.to_string(),
    };
    debug_assert!(model.validate().is_ok());
    Ok(model)
}
