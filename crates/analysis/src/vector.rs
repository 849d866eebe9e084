//! Vector math shared by the analysis engines.

/// Dot product over the common prefix of two vectors.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean norm.
pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Scale to unit length. Zero vectors are returned unchanged.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let n = norm(v);
    if n <= f64::EPSILON {
        return v.to_vec();
    }
    v.iter().map(|x| x / n).collect()
}

/// Cosine similarity between two vectors. Returns 0.0 for zero-length or
/// zero-norm vectors, never NaN.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dim = a.len().min(b.len());
    if dim == 0 {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for i in 0..dim {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0)
}

/// Weighted running mean and variance (West's incremental form).
///
/// Supports multiplicative decay of the accumulated weight, which is how
/// recency weighting is applied: decaying old mass before folding a new
/// sample keeps the variance non-negative at every step and makes
/// one-at-a-time and batched folds produce identical state.
#[derive(Debug, Clone, Default)]
pub struct WeightedMoments {
    pub weight_sum: f64,
    pub mean: f64,
    m2: f64,
}

impl WeightedMoments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted statistics.
    pub fn from_parts(mean: f64, variance: f64, weight_sum: f64) -> Self {
        Self {
            weight_sum,
            mean,
            m2: variance * weight_sum,
        }
    }

    /// Scale the accumulated weight by `factor` in [0, 1]. The mean and
    /// variance estimates keep their values while their weight shrinks.
    pub fn decay(&mut self, factor: f64) {
        self.weight_sum *= factor;
        self.m2 *= factor;
    }

    /// Fold in one observation with weight `w` > 0.
    pub fn update(&mut self, x: f64, w: f64) {
        let new_weight = self.weight_sum + w;
        let delta = x - self.mean;
        self.mean += (w / new_weight) * delta;
        self.m2 += w * delta * (x - self.mean);
        self.weight_sum = new_weight;
    }

    /// Weighted variance. Zero until any weight has accumulated.
    pub fn variance(&self) -> f64 {
        if self.weight_sum <= f64::EPSILON {
            return 0.0;
        }
        (self.m2 / self.weight_sum).max(0.0)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
