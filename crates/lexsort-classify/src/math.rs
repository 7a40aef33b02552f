//! Numeric kernels shared by the trainer and predictor.

use lexsort_types::embedding::NORM_EPSILON;

/// Numerically stable softmax: subtracts the max logit before
/// exponentiating so large logits cannot overflow.
///
/// Degenerate input (all logits -inf) yields a uniform distribution
/// rather than NaNs.
pub fn stable_softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return vec![1.0 / logits.len() as f32; logits.len()];
    }
    exps.iter().map(|&e| e / sum).collect()
}

/// Per-label scores: `logits[k] = W[k]·x + b[k]`.
pub fn logits(weights: &[Vec<f32>], bias: &[f32], x: &[f32]) -> Vec<f32> {
    weights
        .iter()
        .zip(bias.iter())
        .map(|(row, &b)| row.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f32>() + b)
        .collect()
}

/// Index of the largest score; ties resolve to the earliest index.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Rescale to unit L2 norm; near-zero-norm vectors pass through
/// unchanged to avoid dividing by ~0.
pub fn l2_normalize(x: &[f32]) -> Vec<f32> {
    let norm = x.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= NORM_EPSILON {
        return x.to_vec();
    }
    x.iter().map(|v| v / norm).collect()
}
