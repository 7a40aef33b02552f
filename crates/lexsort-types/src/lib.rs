//! # lexsort-types
//!
//! Shared data model for the lexsort categorization engine: embedding
//! vectors and their math, items and assignment results, the classifier
//! model shape, the store trait seams implemented by `lexsort-storage`,
//! and layered configuration loading.

pub mod config;
pub mod embedding;
pub mod item;
pub mod model;
pub mod store;

pub use config::{
    EngineConfig, MatcherSettings, ProviderSettings, TrainingSettings,
};
pub use embedding::{cosine_similarity, CachedEmbeddingEntry, Embedding, EmbeddingSource};
pub use item::{AssignmentResult, Item, ItemKind, LabeledSample};
pub use model::ClassifierModel;
pub use store::{
    EmbeddingStore, ItemStore, ModelStore, PersistedModel, StoreError,
};
