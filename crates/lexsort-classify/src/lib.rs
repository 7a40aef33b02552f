//! # lexsort-classify
//!
//! Multiclass softmax logistic regression over embeddings:
//! - [`trainer`]: mini-batch SGD with stable softmax and L2 decay
//! - [`predictor`]: arg-max label plus the full probability vector
//! - [`persist`]: whole-model JSON persistence, upserted per owner
//! - [`session`]: the train-or-reuse entry point that skips training
//!   entirely when a compatible model and warm cache already exist

pub mod error;
pub mod math;
pub mod persist;
pub mod predictor;
pub mod session;
pub mod trainer;

pub use error::ClassifyError;
pub use persist::{from_persisted, load_model, save_model, to_persisted};
pub use predictor::{predict_text, predict_vector, Prediction};
pub use session::{train_or_reuse, TrainReport};
pub use trainer::{train, TrainOptions, TrainingSample, MODEL_VERSION_TAG};
