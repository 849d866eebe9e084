use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SCHEMA_VERSION;

/// Owner of a fingerprint profile.
pub type UserId = Uuid;

/// Stylometric feature vector. Dimension is fixed per profile or matrix at
/// first use.
pub type FeatureVector = Vec<f64>;

/// Samples a profile needs before drift comparison is meaningful.
pub const MIN_SAMPLES_FOR_FINGERPRINT: u64 = 10;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Where a writing sample came from. Determines its weight under
/// source-weighted aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Academic,
    Essay,
    Document,
    Blog,
    Manual,
    Email,
}

impl SourceType {
    /// Fixed reliability factor per source kind.
    pub fn weight(&self) -> f64 {
        match self {
            SourceType::Academic => 1.3,
            SourceType::Essay => 1.2,
            SourceType::Document => 1.1,
            SourceType::Blog => 1.0,
            SourceType::Manual => 1.0,
            SourceType::Email => 0.9,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Academic => write!(f, "academic"),
            SourceType::Essay => write!(f, "essay"),
            SourceType::Document => write!(f, "document"),
            SourceType::Blog => write!(f, "blog"),
            SourceType::Manual => write!(f, "manual"),
            SourceType::Email => write!(f, "email"),
        }
    }
}

/// How samples are folded into a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Recent samples dominate via exponential decay.
    #[default]
    TimeWeighted,
    /// Plain running mean, no recency bias.
    Average,
    /// Recency decay scaled by the source reliability factor.
    SourceWeighted,
}

/// One writing sample: extracted features plus provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritingSample {
    pub features: FeatureVector,
    pub timestamp: DateTime<Utc>,
    pub source_type: SourceType,
}

impl WritingSample {
    /// Sample stamped with the current time.
    pub fn new(features: FeatureVector, source_type: SourceType) -> Self {
        Self {
            features,
            timestamp: Utc::now(),
            source_type,
        }
    }
}

/// Running moments for one fingerprint feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub variance: f64,
    /// Decayed total sample weight; lets a rehydrated profile resume
    /// updates exactly where it left off.
    pub weight_sum: f64,
    pub sample_count: u64,
}

/// A user's aggregated stylometric fingerprint.
///
/// Mutated only by the fingerprint aggregator; everything else reads
/// snapshots. Serializes to plain JSON for caller-side persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintProfile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub per_feature: Vec<FeatureStats>,
    #[serde(default)]
    pub aggregation_mode: AggregationMode,
    /// Timestamp of the newest folded sample. None until the first sample.
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl FingerprintProfile {
    pub fn new(aggregation_mode: AggregationMode) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            per_feature: Vec::new(),
            aggregation_mode,
            last_updated_at: None,
        }
    }

    /// Feature dimensionality; 0 until the first sample fixes it.
    pub fn dimension(&self) -> usize {
        self.per_feature.len()
    }

    /// Number of samples folded in. All features update together, so the
    /// first feature's count speaks for the profile.
    pub fn sample_count(&self) -> u64 {
        self.per_feature.first().map(|s| s.sample_count).unwrap_or(0)
    }

    pub fn is_ready(&self) -> bool {
        self.sample_count() >= MIN_SAMPLES_FOR_FINGERPRINT
    }

    /// Current per-feature means.
    pub fn mean_vector(&self) -> FeatureVector {
        self.per_feature.iter().map(|s| s.mean).collect()
    }
}

/// A single feature's normalized deviation from the profile mean.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureDeviation {
    pub feature_index: usize,
    /// Signed deviation in profile standard deviations.
    pub deviation: f64,
}

/// Similarity verdict tiers for drift comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityTier {
    High,
    Medium,
    Low,
    Drift,
}

impl SimilarityTier {
    /// Classify a similarity score: High >= 0.85, Medium >= 0.70,
    /// Low >= 0.50, else Drift.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            SimilarityTier::High
        } else if score >= 0.70 {
            SimilarityTier::Medium
        } else if score >= 0.50 {
            SimilarityTier::Low
        } else {
            SimilarityTier::Drift
        }
    }
}

impl std::fmt::Display for SimilarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityTier::High => write!(f, "high"),
            SimilarityTier::Medium => write!(f, "medium"),
            SimilarityTier::Low => write!(f, "low"),
            SimilarityTier::Drift => write!(f, "drift"),
        }
    }
}

/// Outcome of comparing new text against a fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftAlert {
    pub similarity_score: f64,
    pub tier: SimilarityTier,
    /// Half-width of the 95% confidence interval, reported alongside the
    /// score and never folded into it.
    pub confidence_interval: f64,
    /// Worst-deviating features, ranked by |deviation| descending.
    pub top_deviations: Vec<FeatureDeviation>,
}
