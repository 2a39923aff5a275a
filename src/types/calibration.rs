//! Calibration profile: the at-rest noise floor and the detection threshold

use serde::{Deserialize, Serialize};

/// Default multiplier applied to the noise floor.
pub const THRESHOLD_MULTIPLIER: f64 = 2.0;

/// Default constant added after scaling the noise floor (m/s²).
pub const THRESHOLD_ADDER: f64 = 0.5;

/// Result of the startup calibration burst. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// Mean vibration magnitude observed at rest (m/s²)
    pub noise_floor: f64,
    /// Magnitude above which the motor is considered vibrating (m/s²)
    pub threshold: f64,
}

impl CalibrationProfile {
    /// `threshold = noise_floor × multiplier + offset`
    pub fn from_noise_floor(noise_floor: f64, multiplier: f64, offset: f64) -> Self {
        Self {
            noise_floor,
            threshold: noise_floor * multiplier + offset,
        }
    }

    /// Average a burst of at-rest magnitudes into a profile.
    ///
    /// Returns `None` for an empty burst.
    pub fn from_samples(magnitudes: &[f64], multiplier: f64, offset: f64) -> Option<Self> {
        if magnitudes.is_empty() {
            return None;
        }
        let noise_floor = magnitudes.iter().sum::<f64>() / magnitudes.len() as f64;
        Some(Self::from_noise_floor(noise_floor, multiplier, offset))
    }
}
