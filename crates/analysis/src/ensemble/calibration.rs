//! Probability recalibration strategies.
//!
//! Raw weighted averages compress toward the middle of [0, 1]; a fitted
//! sigmoid remap spreads them back out. The strategy is chosen when the
//! detector is built, so callers without fitted parameters get an explicit
//! uncalibrated mode instead of a failure.

use serde::{Deserialize, Serialize};

/// Maps a raw combined probability onto a calibrated one.
pub trait CalibrationStrategy: Send + Sync {
    /// Transform a raw probability in [0, 1].
    fn calibrate(&self, raw: f64) -> f64;

    /// Whether results produced through this strategy count as calibrated.
    fn is_calibrated(&self) -> bool;
}

/// Platt-style sigmoid recalibration: `sigma(slope * logit(p) + intercept)`.
///
/// Monotonic for positive slope. Parameters come from an offline fit on
/// labelled feedback; this type only applies them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattCalibration {
    pub slope: f64,
    pub intercept: f64,
}

impl PlattCalibration {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }
}

impl CalibrationStrategy for PlattCalibration {
    fn calibrate(&self, raw: f64) -> f64 {
        sigmoid_clamped(self.slope * logit_safe(raw) + self.intercept)
    }

    fn is_calibrated(&self) -> bool {
        true
    }
}

/// Pass-through used when no calibration has been fitted. Results carry
/// `calibrated = false` so downstream consumers can tell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawAverage;

impl CalibrationStrategy for RawAverage {
    fn calibrate(&self, raw: f64) -> f64 {
        raw
    }

    fn is_calibrated(&self) -> bool {
        false
    }
}

fn logit_safe(p: f64) -> f64 {
    let p = p.clamp(1e-6, 1.0 - 1e-6);
    (p / (1.0 - p)).ln()
}

fn sigmoid_clamped(x: f64) -> f64 {
    if x > 40.0 {
        1.0
    } else if x < -40.0 {
        0.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_parameters_round_trip() {
        let cal = PlattCalibration::new(1.0, 0.0);
        for p in [0.1, 0.3, 0.5, 0.71, 0.9] {
            assert!((cal.calibrate(p) - p).abs() < 1e-9, "p = {}", p);
        }
    }

    #[test]
    fn positive_slope_is_monotonic() {
        let cal = PlattCalibration::new(1.7, -0.2);
        let mut prev = cal.calibrate(0.0);
        for i in 1..=100 {
            let p = i as f64 / 100.0;
            let cur = cal.calibrate(p);
            assert!(cur >= prev, "not monotonic at p = {}", p);
            prev = cur;
        }
    }

    #[test]
    fn endpoints_stay_in_range() {
        let cal = PlattCalibration::new(3.0, 1.5);
        let lo = cal.calibrate(0.0);
        let hi = cal.calibrate(1.0);
        assert!((0.0..=1.0).contains(&lo));
        assert!((0.0..=1.0).contains(&hi));
        assert!(lo < hi);
    }

    #[test]
    fn steep_slope_sharpens_midrange() {
        let cal = PlattCalibration::new(2.0, 0.0);
        // Slope > 1 pushes values away from 0.5.
        assert!(cal.calibrate(0.7) > 0.7);
        assert!(cal.calibrate(0.3) < 0.3);
        assert!((cal.calibrate(0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn raw_average_is_passthrough() {
        let cal = RawAverage;
        assert_eq!(cal.calibrate(0.42), 0.42);
        assert!(!cal.is_calibrated());
    }

    #[test]
    fn sigmoid_extremes_clamp() {
        assert_eq!(sigmoid_clamped(100.0), 1.0);
        assert_eq!(sigmoid_clamped(-100.0), 0.0);
        assert!((sigmoid_clamped(0.0) - 0.5).abs() < 1e-12);
    }
}
