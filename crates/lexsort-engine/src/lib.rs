//! # lexsort-engine
//!
//! Job orchestration for lexsort. Each job wires the RocksDB stores,
//! the embedding fetcher, and a progress sink together:
//! - [`CategorizeJob`]: streaming category assignment for every target
//! - [`TrainJob`]: train-or-reuse for the owner's classifier model
//! - [`predict_one`]: one-shot prediction against a persisted model
//!
//! One job per process; the `lexsort-job` binary is the entry point a
//! host process spawns and reads NDJSON events from.

pub mod categorize;
pub mod cli;
pub mod error;
pub mod input;
pub mod predict;
pub mod train;

pub use categorize::CategorizeJob;
pub use cli::{Cli, Commands};
pub use error::EngineError;
pub use input::{read_items, read_samples};
pub use predict::predict_one;
pub use train::TrainJob;
