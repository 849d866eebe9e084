//! Ensemble detection — weighted soft voting over model scores.
//!
//! Combines independent per-model probabilities into one verdict using
//! reliability weights derived from prediction feedback, then passes the
//! raw result through a calibration strategy.
//!
//! Sub-modules:
//! - [`monitor`] — accuracy tracking and weight derivation
//! - [`calibration`] — recalibration strategies

pub mod calibration;
pub mod monitor;

use tracing::debug;

use stylograph_core::{
    EnsembleConfig, EnsembleResult, ModelContribution, ModelScore, ModelWeight, Result,
    StylographError,
};

pub use calibration::{CalibrationStrategy, PlattCalibration, RawAverage};
pub use monitor::{new_shared_monitor, PerformanceMonitor, SharedPerformanceMonitor};

/// Weighted soft-voting ensemble over independent detection models.
pub struct EnsembleDetector {
    config: EnsembleConfig,
    calibration: Box<dyn CalibrationStrategy>,
}

impl EnsembleDetector {
    /// Detector with default config and no fitted calibration.
    pub fn new() -> Self {
        Self::with_config(EnsembleConfig::default())
    }

    pub fn with_config(config: EnsembleConfig) -> Self {
        Self {
            config,
            calibration: Box::new(RawAverage),
        }
    }

    /// Attach a calibration strategy.
    pub fn with_calibration(mut self, calibration: Box<dyn CalibrationStrategy>) -> Self {
        self.calibration = calibration;
        self
    }

    /// Combine per-model scores into one verdict.
    ///
    /// `combined = sum(w_i * p_i) / sum(w_i)` over the scored models. Scores
    /// without a weight entry use the configured fallback weight; weight
    /// entries without a matching score are ignored.
    pub fn combine(
        &self,
        scores: &[ModelScore],
        weights: &[ModelWeight],
    ) -> Result<EnsembleResult> {
        if scores.is_empty() {
            return Err(StylographError::InsufficientInput("no model scores"));
        }

        for score in scores {
            if !(0.0..=1.0).contains(&score.probability) {
                return Err(StylographError::InvalidScore {
                    model_id: score.model_id.clone(),
                    probability: score.probability,
                });
            }
        }

        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        let mut per_model = Vec::with_capacity(scores.len());

        for score in scores {
            let weight = weights
                .iter()
                .find(|w| w.model_id == score.model_id)
                .map(|w| w.weight)
                .unwrap_or(self.config.fallback_weight);

            if !weight.is_finite() || weight < 0.0 {
                return Err(StylographError::InvalidWeight(format!(
                    "weight {} for model '{}'",
                    weight, score.model_id
                )));
            }

            weighted_sum += weight * score.probability;
            weight_sum += weight;
            per_model.push(ModelContribution {
                model_id: score.model_id.clone(),
                probability: score.probability,
                weight_used: weight,
            });
        }

        if weight_sum <= 0.0 {
            return Err(StylographError::InvalidWeight(format!(
                "non-positive total weight {weight_sum}"
            )));
        }

        let raw = weighted_sum / weight_sum;
        let combined = self.calibration.calibrate(raw).clamp(0.0, 1.0);

        debug!(
            models = scores.len(),
            raw,
            combined,
            calibrated = self.calibration.is_calibrated(),
            "ensemble combine complete"
        );

        Ok(EnsembleResult {
            combined_probability: combined,
            per_model,
            calibrated: self.calibration.is_calibrated(),
        })
    }
}

impl Default for EnsembleDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> Vec<ModelScore> {
        pairs.iter().map(|(id, p)| ModelScore::new(*id, *p)).collect()
    }

    fn weights(pairs: &[(&str, f64)]) -> Vec<ModelWeight> {
        pairs.iter().map(|(id, w)| ModelWeight::new(*id, *w)).collect()
    }

    #[test]
    fn combine_is_weighted_average() {
        let detector = EnsembleDetector::new();
        let result = detector
            .combine(
                &scores(&[("a", 0.8), ("b", 0.6), ("c", 0.7)]),
                &weights(&[("a", 0.4), ("b", 0.3), ("c", 0.3)]),
            )
            .unwrap();

        // 0.8*0.4 + 0.6*0.3 + 0.7*0.3 = 0.71
        assert!((result.combined_probability - 0.71).abs() < 1e-9);
        assert_eq!(result.per_model.len(), 3);
        assert!(!result.calibrated);
    }

    #[test]
    fn empty_scores_rejected() {
        let detector = EnsembleDetector::new();
        let err = detector.combine(&[], &weights(&[("a", 0.5)])).unwrap_err();
        assert!(matches!(err, StylographError::InsufficientInput(_)));
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let detector = EnsembleDetector::new();
        let err = detector
            .combine(&scores(&[("a", 1.5)]), &[])
            .unwrap_err();
        match err {
            StylographError::InvalidScore { model_id, probability } => {
                assert_eq!(model_id, "a");
                assert_eq!(probability, 1.5);
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn unknown_model_gets_fallback_weight() {
        let detector = EnsembleDetector::new();
        let result = detector
            .combine(&scores(&[("known", 0.8), ("unknown", 0.2)]), &weights(&[("known", 0.9)]))
            .unwrap();

        // (0.9*0.8 + 0.1*0.2) / 1.0 = 0.74
        assert!((result.combined_probability - 0.74).abs() < 1e-9);
        let unknown = result
            .per_model
            .iter()
            .find(|c| c.model_id == "unknown")
            .unwrap();
        assert_eq!(unknown.weight_used, 0.1);
    }

    #[test]
    fn unmatched_weight_entries_ignored() {
        let detector = EnsembleDetector::new();
        let result = detector
            .combine(&scores(&[("a", 0.5)]), &weights(&[("a", 0.4), ("ghost", 0.6)]))
            .unwrap();
        assert!((result.combined_probability - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_total_weight_rejected() {
        let detector = EnsembleDetector::new();
        let err = detector
            .combine(&scores(&[("a", 0.5)]), &weights(&[("a", 0.0)]))
            .unwrap_err();
        assert!(matches!(err, StylographError::InvalidWeight(_)));
    }

    #[test]
    fn negative_weight_rejected() {
        let detector = EnsembleDetector::new();
        let err = detector
            .combine(&scores(&[("a", 0.5)]), &weights(&[("a", -0.2)]))
            .unwrap_err();
        assert!(matches!(err, StylographError::InvalidWeight(_)));
    }

    #[test]
    fn platt_calibration_marks_result() {
        let detector =
            EnsembleDetector::new().with_calibration(Box::new(PlattCalibration::new(1.0, 0.0)));
        let result = detector
            .combine(
                &scores(&[("a", 0.8), ("b", 0.6), ("c", 0.7)]),
                &weights(&[("a", 0.4), ("b", 0.3), ("c", 0.3)]),
            )
            .unwrap();

        // Identity parameters leave the raw average untouched.
        assert!((result.combined_probability - 0.71).abs() < 1e-9);
        assert!(result.calibrated);
    }

    #[test]
    fn single_model_passes_through() {
        let detector = EnsembleDetector::new();
        let result = detector.combine(&scores(&[("only", 0.42)]), &[]).unwrap();
        assert!((result.combined_probability - 0.42).abs() < 1e-9);
        assert_eq!(result.per_model[0].weight_used, 0.1);
    }
}
