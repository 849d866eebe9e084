use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One detection model's probability estimate for a single text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelScore {
    pub model_id: String,
    /// Probability the text is machine-generated, in [0, 1].
    pub probability: f64,
}

impl ModelScore {
    pub fn new(model_id: impl Into<String>, probability: f64) -> Self {
        Self {
            model_id: model_id.into(),
            probability,
        }
    }
}

/// Reliability weight assigned to a model.
///
/// Derived sets are normalized to sum 1.0, with each weight clamped to the
/// configured floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelWeight {
    pub model_id: String,
    pub weight: f64,
}

impl ModelWeight {
    pub fn new(model_id: impl Into<String>, weight: f64) -> Self {
        Self {
            model_id: model_id.into(),
            weight,
        }
    }
}

/// One model's share of a combined verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelContribution {
    pub model_id: String,
    pub probability: f64,
    pub weight_used: f64,
}

/// Combined ensemble verdict for one text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub combined_probability: f64,
    pub per_model: Vec<ModelContribution>,
    /// False when the detector fell back to the uncalibrated raw average.
    pub calibrated: bool,
}

/// Ground-truth feedback for one past prediction (append-only log entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub model_id: String,
    pub predicted_probability: f64,
    /// True when the text was in fact machine-generated.
    pub actual_label: bool,
    pub timestamp: DateTime<Utc>,
}

impl PerformanceRecord {
    pub fn new(
        model_id: impl Into<String>,
        predicted_probability: f64,
        actual_label: bool,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            predicted_probability,
            actual_label,
            timestamp: Utc::now(),
        }
    }
}

/// Rolling accuracy state for one model. Owned by the performance monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPerformanceState {
    pub model_id: String,
    /// Exponential moving average of the Brier score. Lower is better.
    pub brier_ema: f64,
    pub sample_count: u64,
    pub last_updated: DateTime<Utc>,
}
