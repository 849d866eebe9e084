//! User fingerprint aggregation.
//!
//! Maintains per-feature running statistics over a user's writing samples.
//! Three aggregation modes: recency-weighted (default), plain average, and
//! source-weighted (recency times source reliability).
//!
//! Sub-modules:
//! - [`drift`] — compare new text against an aggregated profile
//! - [`registry`] — thread-safe per-user profile store

pub mod drift;
pub mod registry;

use chrono::{DateTime, Utc};
use tracing::debug;

use stylograph_core::{
    AggregationMode, FeatureStats, FingerprintConfig, FingerprintProfile, Result,
    StylographError, WritingSample,
};

use crate::vector::WeightedMoments;

pub use drift::DriftComparator;
pub use registry::ProfileRegistry;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Folds writing samples into per-feature fingerprint statistics.
///
/// The sole mutator of [`FingerprintProfile`]. Callers apply samples per
/// profile in non-decreasing timestamp order; before each fold, previously
/// accumulated mass is decayed by `exp(-lambda * gap_days)`, so a sample
/// `d` days behind the newest contributes `exp(-lambda * d)` of a fresh
/// sample's weight.
pub struct FingerprintAggregator {
    /// Per-day decay rate, `-ln(recency_alpha)`.
    lambda: f64,
}

impl FingerprintAggregator {
    pub fn new() -> Self {
        Self::with_config(FingerprintConfig::default())
    }

    pub fn with_config(config: FingerprintConfig) -> Self {
        Self {
            lambda: -config.recency_alpha.ln(),
        }
    }

    /// Fold one sample into the profile under its aggregation mode.
    ///
    /// The first sample fixes the profile's dimensionality; later samples
    /// must match it.
    pub fn update(&self, profile: &mut FingerprintProfile, sample: &WritingSample) -> Result<()> {
        if sample.features.is_empty() {
            return Err(StylographError::InsufficientInput("empty feature vector"));
        }
        if profile.per_feature.is_empty() {
            profile.per_feature = vec![FeatureStats::default(); sample.features.len()];
        } else if sample.features.len() != profile.per_feature.len() {
            return Err(StylographError::DimensionMismatch {
                expected: profile.per_feature.len(),
                actual: sample.features.len(),
            });
        }

        let decay = match profile.aggregation_mode {
            AggregationMode::Average => 1.0,
            _ => self.decay_factor(profile.last_updated_at, sample.timestamp),
        };
        let weight = match profile.aggregation_mode {
            AggregationMode::SourceWeighted => sample.source_type.weight(),
            _ => 1.0,
        };

        for (stats, &x) in profile.per_feature.iter_mut().zip(&sample.features) {
            let mut moments =
                WeightedMoments::from_parts(stats.mean, stats.variance, stats.weight_sum);
            moments.decay(decay);
            moments.update(x, weight);
            stats.mean = moments.mean;
            stats.variance = moments.variance();
            stats.weight_sum = moments.weight_sum;
            stats.sample_count += 1;
        }
        profile.last_updated_at = Some(sample.timestamp);

        Ok(())
    }

    /// Fold a batch of samples in order. Produces exactly the same state as
    /// repeated [`update`](Self::update) calls.
    pub fn update_batch(
        &self,
        profile: &mut FingerprintProfile,
        samples: &[WritingSample],
    ) -> Result<()> {
        for sample in samples {
            self.update(profile, sample)?;
        }
        debug!(
            samples = samples.len(),
            dim = profile.dimension(),
            total = profile.sample_count(),
            "fingerprint batch applied"
        );
        Ok(())
    }

    /// Multiplier applied to previously accumulated mass. Negative gaps
    /// (out-of-order callers) clamp to no decay rather than amplifying
    /// old data.
    fn decay_factor(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let Some(last) = last else { return 1.0 };
        let gap_days = (now - last).num_milliseconds() as f64 / (SECONDS_PER_DAY * 1000.0);
        if gap_days <= 0.0 {
            1.0
        } else {
            (-self.lambda * gap_days).exp()
        }
    }
}

impl Default for FingerprintAggregator {
    fn default() -> Self {
        Self::new()
    }
}
