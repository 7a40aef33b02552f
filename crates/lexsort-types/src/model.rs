//! Classifier model shape.

use serde::{Deserialize, Serialize};

/// A trained multiclass softmax logistic-regression model.
///
/// Created atomically by the trainer, persisted as a whole, and never
/// partially updated. `weights`, `bias` and `labels` are index-aligned:
/// row k scores label k.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierModel {
    /// K rows of D columns
    pub weights: Vec<Vec<f32>>,
    /// One bias per label
    pub bias: Vec<f32>,
    /// Labels in first-seen training order
    pub labels: Vec<String>,
    /// Embedding dimension D the model was trained at
    pub dimension: usize,
    /// Trainer version tag, checked before reusing a persisted model
    pub version_tag: String,
}

impl ClassifierModel {
    /// Number of labels K.
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Check the structural invariants: one weight row and one bias per
    /// label, and every row of width `dimension`.
    pub fn validate(&self) -> Result<(), String> {
        if self.labels.is_empty() {
            return Err("model has no labels".to_string());
        }
        if self.weights.len() != self.labels.len() {
            return Err(format!(
                "weight rows ({}) != labels ({})",
                self.weights.len(),
                self.labels.len()
            ));
        }
        if self.bias.len() != self.labels.len() {
            return Err(format!(
                "bias entries ({}) != labels ({})",
                self.bias.len(),
                self.labels.len()
            ));
        }
        if let Some(row) = self.weights.iter().find(|r| r.len() != self.dimension) {
            return Err(format!(
                "weight row width {} != dimension {}",
                row.len(),
                self.dimension
            ));
        }
        Ok(())
    }
}
