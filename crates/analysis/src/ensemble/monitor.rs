//! Model accuracy tracking and weight derivation.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use indexmap::IndexMap;
use tracing::debug;

use stylograph_core::{
    EnsembleConfig, ModelPerformanceState, ModelWeight, PerformanceRecord, Result,
    StylographError,
};

/// Guard against division by a near-zero Brier EMA.
const BRIER_EPSILON: f64 = 1e-6;

/// Tracks per-model prediction accuracy and derives ensemble weights.
///
/// Owns all [`ModelPerformanceState`]; nothing else mutates it. Weight
/// derivation only considers models past the feedback threshold, so a cold
/// model cannot perturb proven weights.
pub struct PerformanceMonitor {
    config: EnsembleConfig,
    states: IndexMap<String, ModelPerformanceState>,
    weights: IndexMap<String, f64>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::with_config(EnsembleConfig::default())
    }

    pub fn with_config(config: EnsembleConfig) -> Self {
        Self {
            config,
            states: IndexMap::new(),
            weights: IndexMap::new(),
        }
    }

    /// Restore a monitor from persisted per-model states.
    pub fn with_states(config: EnsembleConfig, states: Vec<ModelPerformanceState>) -> Self {
        let mut monitor = Self::with_config(config);
        for state in states {
            monitor.states.insert(state.model_id.clone(), state);
        }
        monitor
    }

    /// Seed the stored weight table, e.g. with the last derived set.
    pub fn with_weights(mut self, weights: Vec<ModelWeight>) -> Self {
        for w in weights {
            self.weights.insert(w.model_id, w.weight);
        }
        self
    }

    /// Fold one ground-truth outcome into the model's Brier EMA.
    ///
    /// Unknown models get fresh state on first feedback; their first record
    /// initializes the EMA to its own Brier score.
    pub fn record(
        &mut self,
        model_id: &str,
        predicted_probability: f64,
        actual_label: bool,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&predicted_probability) {
            return Err(StylographError::InvalidScore {
                model_id: model_id.to_string(),
                probability: predicted_probability,
            });
        }

        let outcome = if actual_label { 1.0 } else { 0.0 };
        let brier = (predicted_probability - outcome).powi(2);
        let alpha = self.config.brier_ema_alpha;
        let now = Utc::now();

        match self.states.get_mut(model_id) {
            Some(state) => {
                state.brier_ema = (1.0 - alpha) * state.brier_ema + alpha * brier;
                state.sample_count += 1;
                state.last_updated = now;
            }
            None => {
                self.states.insert(
                    model_id.to_string(),
                    ModelPerformanceState {
                        model_id: model_id.to_string(),
                        brier_ema: brier,
                        sample_count: 1,
                        last_updated: now,
                    },
                );
            }
        }

        Ok(())
    }

    /// Fold a batch of feedback records in order.
    pub fn record_batch(&mut self, records: &[PerformanceRecord]) -> Result<()> {
        for record in records {
            self.record(&record.model_id, record.predicted_probability, record.actual_label)?;
        }
        Ok(())
    }

    /// Derive fresh weights for every model past the feedback threshold.
    ///
    /// Eligible weights are proportional to inverse Brier EMA, normalized to
    /// sum 1.0, each clamped to the configured floor with the remaining mass
    /// redistributed proportionally. When the floor is infeasible (more
    /// eligible models than `1 / floor`) the split degrades to uniform.
    ///
    /// Models still below the threshold keep whatever weight was stored
    /// before; with no eligible models the stored table is returned
    /// unchanged. Idempotent given no new records.
    pub fn derive_weights(&mut self) -> Vec<ModelWeight> {
        let eligible: Vec<(&str, f64)> = self
            .states
            .values()
            .filter(|s| s.sample_count >= self.config.min_samples_for_weighting)
            .map(|s| (s.model_id.as_str(), 1.0 / s.brier_ema.max(BRIER_EPSILON)))
            .collect();

        if !eligible.is_empty() {
            let derived = floor_normalize(&eligible, self.config.weight_floor);
            debug!(
                eligible = derived.len(),
                tracked = self.states.len(),
                "model weights derived"
            );
            for (model_id, weight) in derived {
                self.weights.insert(model_id, weight);
            }
        }

        self.current_weights()
    }

    /// Snapshot of the stored weight table in insertion order.
    pub fn current_weights(&self) -> Vec<ModelWeight> {
        self.weights
            .iter()
            .map(|(model_id, &weight)| ModelWeight {
                model_id: model_id.clone(),
                weight,
            })
            .collect()
    }

    /// Snapshot of all per-model states for persistence.
    pub fn states(&self) -> Vec<ModelPerformanceState> {
        self.states.values().cloned().collect()
    }

    pub fn state(&self, model_id: &str) -> Option<&ModelPerformanceState> {
        self.states.get(model_id)
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize raw scores to sum 1.0, lift entries below `floor`, and
/// redistribute the remaining mass over the rest until stable.
fn floor_normalize(candidates: &[(&str, f64)], floor: f64) -> Vec<(String, f64)> {
    let n = candidates.len();
    if floor * n as f64 >= 1.0 {
        // Floor and unit sum cannot both hold; degrade to a uniform split.
        return candidates
            .iter()
            .map(|(id, _)| (id.to_string(), 1.0 / n as f64))
            .collect();
    }

    let total: f64 = candidates.iter().map(|(_, raw)| raw).sum();
    let mut weights: Vec<f64> = candidates.iter().map(|(_, raw)| raw / total).collect();
    let mut pinned = vec![false; n];

    loop {
        let mut newly_pinned = false;
        for i in 0..n {
            if !pinned[i] && weights[i] < floor {
                weights[i] = floor;
                pinned[i] = true;
                newly_pinned = true;
            }
        }
        if !newly_pinned {
            break;
        }

        let pinned_mass: f64 = (0..n).filter(|&i| pinned[i]).map(|i| weights[i]).sum();
        let free_mass: f64 = (0..n).filter(|&i| !pinned[i]).map(|i| weights[i]).sum();
        if free_mass <= f64::EPSILON {
            break;
        }
        let scale = (1.0 - pinned_mass) / free_mass;
        for i in 0..n {
            if !pinned[i] {
                weights[i] *= scale;
            }
        }
    }

    candidates
        .iter()
        .zip(weights)
        .map(|((id, _), weight)| (id.to_string(), weight))
        .collect()
}

/// Thread-safe handle to a shared performance monitor.
pub type SharedPerformanceMonitor = Arc<RwLock<PerformanceMonitor>>;

/// Create a new shared monitor with default config.
pub fn new_shared_monitor() -> SharedPerformanceMonitor {
    Arc::new(RwLock::new(PerformanceMonitor::new()))
}
