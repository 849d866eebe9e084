pub mod cluster;
pub mod ensemble;
pub mod fingerprint;
pub mod vector;

pub use cluster::ClusterEngine;
pub use ensemble::{
    new_shared_monitor, CalibrationStrategy, EnsembleDetector, PerformanceMonitor,
    PlattCalibration, RawAverage, SharedPerformanceMonitor,
};
pub use fingerprint::{DriftComparator, FingerprintAggregator, ProfileRegistry};
pub use vector::WeightedMoments;
