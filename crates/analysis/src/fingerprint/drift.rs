//! Drift comparison against an aggregated fingerprint.

use tracing::debug;

use stylograph_core::{
    DriftAlert, DriftConfig, FeatureDeviation, FeatureVector, FingerprintProfile, Result,
    SimilarityTier, StylographError,
};

/// Deviation reported for a feature whose profile variance is zero but whose
/// value moved anyway. Far beyond any tier boundary, finite so ranking and
/// the similarity mapping stay well-defined.
pub const ZERO_STD_DEVIATION: f64 = 10.0;

/// Agreement tolerance for the zero-variance equality check.
const EQ_EPS: f64 = 1e-9;

/// Compares new text features against a user's fingerprint.
pub struct DriftComparator {
    config: DriftConfig,
}

impl DriftComparator {
    pub fn new() -> Self {
        Self::with_config(DriftConfig::default())
    }

    pub fn with_config(config: DriftConfig) -> Self {
        Self { config }
    }

    /// Score new features against the profile.
    ///
    /// Each feature's deviation is measured in profile standard deviations;
    /// similarity is `1 / (1 + mean |deviation|)`, so zero deviation maps to
    /// 1.0 and large deviations approach 0. The 95% confidence half-width is
    /// reported alongside the score, never folded into it.
    pub fn compare(
        &self,
        profile: &FingerprintProfile,
        features: &FeatureVector,
    ) -> Result<DriftAlert> {
        let have = profile.sample_count();
        if have < self.config.min_samples {
            return Err(StylographError::InsufficientSamples {
                have,
                need: self.config.min_samples,
            });
        }
        if features.len() != profile.dimension() {
            return Err(StylographError::DimensionMismatch {
                expected: profile.dimension(),
                actual: features.len(),
            });
        }

        let mut deviations = Vec::with_capacity(features.len());
        let mut abs_sum = 0.0;
        let mut variance_sum = 0.0;

        for (i, (stats, &x)) in profile.per_feature.iter().zip(features).enumerate() {
            let std = stats.variance.max(0.0).sqrt();
            let deviation = if std <= EQ_EPS {
                if (x - stats.mean).abs() <= EQ_EPS {
                    0.0
                } else {
                    ZERO_STD_DEVIATION * (x - stats.mean).signum()
                }
            } else {
                (x - stats.mean) / std
            };
            abs_sum += deviation.abs();
            variance_sum += stats.variance;
            deviations.push(FeatureDeviation {
                feature_index: i,
                deviation,
            });
        }

        let n = features.len() as f64;
        let similarity_score = 1.0 / (1.0 + abs_sum / n);

        // Standard error of the mean across features, 95% half-width.
        let mean_variance = variance_sum / n;
        let confidence_interval = 1.96 * (mean_variance / n).sqrt();

        let tier = self.classify(similarity_score);

        deviations.sort_by(|a, b| {
            b.deviation
                .abs()
                .partial_cmp(&a.deviation.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.feature_index.cmp(&b.feature_index))
        });
        deviations.truncate(self.config.top_deviations);

        debug!(
            similarity = similarity_score,
            tier = %tier,
            samples = have,
            "drift comparison complete"
        );

        Ok(DriftAlert {
            similarity_score,
            tier,
            confidence_interval,
            top_deviations: deviations,
        })
    }

    /// Classify a similarity score with the configured tier thresholds.
    pub fn classify(&self, score: f64) -> SimilarityTier {
        if score >= self.config.tier_high {
            SimilarityTier::High
        } else if score >= self.config.tier_medium {
            SimilarityTier::Medium
        } else if score >= self.config.tier_low {
            SimilarityTier::Low
        } else {
            SimilarityTier::Drift
        }
    }
}

impl Default for DriftComparator {
    fn default() -> Self {
        Self::new()
    }
}
