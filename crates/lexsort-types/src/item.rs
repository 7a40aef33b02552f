//! Items, samples, and assignment results.

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingSource;

/// Which collection an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Free-text items to be assigned to categories
    Target,
    /// The categories being matched against
    Category,
}

impl ItemKind {
    /// Short tag used in storage keys.
    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::Target => "tgt",
            ItemKind::Category => "cat",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Target => write!(f, "target"),
            ItemKind::Category => write!(f, "category"),
        }
    }
}

/// A target or category item, loaded in bounded pages and discarded
/// after its page has been processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Stable, monotonically increasing id (cursor key)
    pub id: u64,
    /// The keyword-like text
    pub text: String,
    /// Whether the item's embedding is known to be cached already
    #[serde(default)]
    pub ready: bool,
}

impl Item {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            ready: false,
        }
    }
}

/// A labeled training sample, owned by an upstream sample store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledSample {
    pub id: u64,
    pub text: String,
    pub label: String,
}

/// The outcome of matching one target item against all categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub item_id: u64,
    pub best_category_id: u64,
    pub best_category_name: String,
    /// Raw cosine similarity in [-1, 1]; any display normalization is a
    /// presentation concern outside the engine.
    pub similarity: f32,
    pub embedding_source: EmbeddingSource,
}
