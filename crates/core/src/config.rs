use serde::{Deserialize, Serialize};

// ── Ensemble ──────────────────────────────────────────────────

/// Ensemble detector and performance monitor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// EMA smoothing factor for Brier score updates.
    #[serde(default = "default_brier_ema_alpha")]
    pub brier_ema_alpha: f64,
    /// Feedback records before a model's weight is derived.
    #[serde(default = "default_min_samples_for_weighting")]
    pub min_samples_for_weighting: u64,
    /// Lower bound for derived weights.
    #[serde(default = "default_weight_floor")]
    pub weight_floor: f64,
    /// Weight used for scores with no derived weight entry.
    #[serde(default = "default_fallback_weight")]
    pub fallback_weight: f64,
}

fn default_brier_ema_alpha() -> f64 { 0.3 }
fn default_min_samples_for_weighting() -> u64 { 100 }
fn default_weight_floor() -> f64 { 0.1 }
fn default_fallback_weight() -> f64 { 0.1 }

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            brier_ema_alpha: default_brier_ema_alpha(),
            min_samples_for_weighting: default_min_samples_for_weighting(),
            weight_floor: default_weight_floor(),
            fallback_weight: default_fallback_weight(),
        }
    }
}

// ── Clustering ────────────────────────────────────────────────

/// Similarity clustering tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Pairs at or above this cosine similarity are merged transitively.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 { 0.85 }

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

// ── Fingerprint ───────────────────────────────────────────────

/// Fingerprint aggregation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Recency smoothing factor; the per-day decay rate is `-ln(alpha)`.
    #[serde(default = "default_recency_alpha")]
    pub recency_alpha: f64,
}

fn default_recency_alpha() -> f64 { 0.3 }

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            recency_alpha: default_recency_alpha(),
        }
    }
}

// ── Drift ─────────────────────────────────────────────────────

/// Drift comparator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Profile samples required before comparison is allowed.
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,
    /// Similarity at or above which the verdict is High.
    #[serde(default = "default_tier_high")]
    pub tier_high: f64,
    /// Similarity at or above which the verdict is Medium.
    #[serde(default = "default_tier_medium")]
    pub tier_medium: f64,
    /// Similarity at or above which the verdict is Low; below is Drift.
    #[serde(default = "default_tier_low")]
    pub tier_low: f64,
    /// Number of worst-deviating features reported per alert.
    #[serde(default = "default_top_deviations")]
    pub top_deviations: usize,
}

fn default_min_samples() -> u64 { crate::profile::MIN_SAMPLES_FOR_FINGERPRINT }
fn default_tier_high() -> f64 { 0.85 }
fn default_tier_medium() -> f64 { 0.70 }
fn default_tier_low() -> f64 { 0.50 }
fn default_top_deviations() -> usize { 5 }

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            tier_high: default_tier_high(),
            tier_medium: default_tier_medium(),
            tier_low: default_tier_low(),
            top_deviations: default_top_deviations(),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Full analysis configuration, typically parsed from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub ensemble: EnsembleConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    #[serde(default)]
    pub drift: DriftConfig,
}

impl AnalysisConfig {
    /// Print an effective-settings summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Analysis config loaded:");
        tracing::info!(
            "  ensemble:    alpha={}, min_samples={}, floor={}",
            self.ensemble.brier_ema_alpha,
            self.ensemble.min_samples_for_weighting,
            self.ensemble.weight_floor
        );
        tracing::info!("  cluster:     threshold={}", self.cluster.similarity_threshold);
        tracing::info!("  fingerprint: recency_alpha={}", self.fingerprint.recency_alpha);
        tracing::info!(
            "  drift:       tiers={}/{}/{}, top_deviations={}",
            self.drift.tier_high,
            self.drift.tier_medium,
            self.drift.tier_low,
            self.drift.top_deviations
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensemble_config_defaults() {
        let config = EnsembleConfig::default();
        assert_eq!(config.brier_ema_alpha, 0.3);
        assert_eq!(config.min_samples_for_weighting, 100);
        assert_eq!(config.weight_floor, 0.1);
        assert_eq!(config.fallback_weight, 0.1);
    }

    #[test]
    fn cluster_config_defaults() {
        let config = ClusterConfig::default();
        assert_eq!(config.similarity_threshold, 0.85);
    }

    #[test]
    fn drift_config_defaults() {
        let config = DriftConfig::default();
        assert_eq!(config.min_samples, 10);
        assert_eq!(config.tier_high, 0.85);
        assert_eq!(config.tier_medium, 0.70);
        assert_eq!(config.tier_low, 0.50);
        assert_eq!(config.top_deviations, 5);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"ensemble": {"weight_floor": 0.2}}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.ensemble.weight_floor, 0.2);
        assert_eq!(config.ensemble.brier_ema_alpha, 0.3);
        assert_eq!(config.cluster.similarity_threshold, 0.85);
        assert_eq!(config.fingerprint.recency_alpha, 0.3);
        assert_eq!(config.drift.min_samples, 10);
    }
}
