//! Embedding vector type and the vector math used across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Norms below this are treated as zero; the vector passes through
/// normalization unchanged instead of dividing by ~0 and producing NaNs.
pub const NORM_EPSILON: f32 = 1e-12;

/// Where an embedding came from when a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    /// Read from the persistent cache
    Cache,
    /// Fetched from the external provider during this run
    Provider,
    /// Origin not tracked (e.g. the item carried its own vector)
    Unknown,
}

/// A fixed-length embedding vector.
///
/// The dimension is determined by the provider model; nothing in the
/// engine assumes a particular value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The raw vector components
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// L2 norm of the vector.
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|x| x.is_finite())
    }

    /// Return a unit-length copy of this vector.
    ///
    /// Near-zero-norm vectors are returned unchanged.
    pub fn l2_normalized(&self) -> Embedding {
        let norm = self.norm();
        if norm <= NORM_EPSILON {
            return self.clone();
        }
        Embedding::new(self.values.iter().map(|x| x / norm).collect())
    }

    /// Compute cosine similarity with another embedding.
    ///
    /// Returns a value in [-1, 1]; defined as 0.0 when either vector has
    /// zero norm or the dimensions disagree.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        cosine_similarity(&self.values, &other.values)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Embedding::new(values)
    }
}

/// Cosine similarity over raw slices.
///
/// `dot(a, b) / (‖a‖ × ‖b‖)`, clamped into [-1, 1] to absorb float
/// rounding; 0.0 when either norm is zero or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= NORM_EPSILON || norm_b <= NORM_EPSILON {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// A cached embedding as stored by the persistent cache.
///
/// Identity key is the (text, model_name) pair. Once cached a vector is
/// never mutated in place, only replaced wholesale by an explicit put.
#[derive(Debug, Clone)]
pub struct CachedEmbeddingEntry {
    pub text: String,
    pub model_name: String,
    pub vector: Vec<f32>,
    /// When the entry was first written; `None` for entries decoded from
    /// the legacy textual format, which carried no timestamp.
    pub inserted_at: Option<DateTime<Utc>>,
}
