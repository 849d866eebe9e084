//! Thread-safe per-user profile store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use stylograph_core::{
    AggregationMode, DriftAlert, FeatureVector, FingerprintProfile, Result, UserId,
    WritingSample,
};

use super::drift::DriftComparator;
use super::FingerprintAggregator;

/// Owns every user's fingerprint behind a per-user lock.
///
/// The outer map lock is held only to look up or insert an entry. Folds take
/// the per-user mutex, so writers for different users never contend, and a
/// single writer per key is guaranteed. Reads clone a snapshot, so drift
/// comparison runs on stable data without blocking writers.
pub struct ProfileRegistry {
    aggregator: FingerprintAggregator,
    comparator: DriftComparator,
    default_mode: AggregationMode,
    profiles: RwLock<HashMap<UserId, Arc<Mutex<FingerprintProfile>>>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::with_components(
            FingerprintAggregator::new(),
            DriftComparator::new(),
            AggregationMode::TimeWeighted,
        )
    }

    pub fn with_components(
        aggregator: FingerprintAggregator,
        comparator: DriftComparator,
        default_mode: AggregationMode,
    ) -> Self {
        Self {
            aggregator,
            comparator,
            default_mode,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Fold one sample into the user's profile, creating it if absent.
    pub fn update(&self, user_id: UserId, sample: &WritingSample) -> Result<()> {
        let entry = self.entry(user_id);
        let mut profile = entry.lock().unwrap();
        self.aggregator.update(&mut profile, sample)
    }

    /// Fold samples in order into the user's profile.
    pub fn update_batch(&self, user_id: UserId, samples: &[WritingSample]) -> Result<()> {
        let entry = self.entry(user_id);
        let mut profile = entry.lock().unwrap();
        self.aggregator.update_batch(&mut profile, samples)
    }

    /// Clone the user's current profile.
    pub fn snapshot(&self, user_id: &UserId) -> Option<FingerprintProfile> {
        let entry = self.profiles.read().unwrap().get(user_id)?.clone();
        let profile = entry.lock().unwrap();
        Some(profile.clone())
    }

    /// Compare features against a stable snapshot of the user's profile.
    ///
    /// An unknown user reads as an empty profile, so the comparison fails
    /// with the usual insufficient-samples error.
    pub fn compare(&self, user_id: &UserId, features: &FeatureVector) -> Result<DriftAlert> {
        let profile = self
            .snapshot(user_id)
            .unwrap_or_else(|| FingerprintProfile::new(self.default_mode));
        self.comparator.compare(&profile, features)
    }

    /// Install a rehydrated profile, replacing any existing one.
    pub fn insert_profile(&self, user_id: UserId, profile: FingerprintProfile) {
        let mut profiles = self.profiles.write().unwrap();
        profiles.insert(user_id, Arc::new(Mutex::new(profile)));
        debug!(users = profiles.len(), "profile installed");
    }

    /// Drop and return the user's profile.
    pub fn remove(&self, user_id: &UserId) -> Option<FingerprintProfile> {
        let entry = self.profiles.write().unwrap().remove(user_id)?;
        let profile = entry.lock().unwrap().clone();
        Some(profile)
    }

    pub fn len(&self) -> usize {
        self.profiles.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, user_id: UserId) -> Arc<Mutex<FingerprintProfile>> {
        if let Some(entry) = self.profiles.read().unwrap().get(&user_id) {
            return entry.clone();
        }
        let mut profiles = self.profiles.write().unwrap();
        profiles
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(FingerprintProfile::new(self.default_mode))))
            .clone()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
