//! Accelerometer samples and the vibration magnitude derived from them

use std::time::Instant;

/// Gravity offset subtracted from the Z axis before any derived value (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.8;

// ============================================================================
// Sensor Sample
// ============================================================================

/// One reading of the 3-axis accelerometer plus its die temperature.
///
/// Axes are stored exactly as the sensor reported them. Gravity compensation
/// happens once, in [`SensorSample::az_compensated`], and every derived value
/// (magnitude, published axes) goes through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// X acceleration (m/s²)
    pub ax: f64,
    /// Y acceleration (m/s²)
    pub ay: f64,
    /// Raw Z acceleration including gravity (m/s²)
    pub az: f64,
    /// Sensor temperature (°C)
    pub temperature: f64,
    /// Monotonic capture instant
    pub timestamp: Instant,
}

impl SensorSample {
    /// Create a sample stamped with the current instant.
    pub fn new(ax: f64, ay: f64, az: f64, temperature: f64) -> Self {
        Self::with_timestamp(ax, ay, az, temperature, Instant::now())
    }

    pub fn with_timestamp(ax: f64, ay: f64, az: f64, temperature: f64, timestamp: Instant) -> Self {
        Self {
            ax,
            ay,
            az,
            temperature,
            timestamp,
        }
    }

    /// Z acceleration with the gravity offset removed.
    pub fn az_compensated(&self, gravity: f64) -> f64 {
        self.az - gravity
    }

    /// Vibration magnitude of this sample.
    pub fn magnitude(&self, gravity: f64) -> VibrationMagnitude {
        VibrationMagnitude::from_axes(self.ax, self.ay, self.az_compensated(gravity))
    }
}

// ============================================================================
// Vibration Magnitude
// ============================================================================

/// Euclidean norm of the gravity-compensated acceleration vector.
///
/// Always finite and >= 0 for finite inputs.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct VibrationMagnitude(f64);

impl VibrationMagnitude {
    pub const ZERO: Self = Self(0.0);

    /// Build from already-compensated axes.
    pub fn from_axes(ax: f64, ay: f64, az_compensated: f64) -> Self {
        Self((ax * ax + ay * ay + az_compensated * az_compensated).sqrt())
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for VibrationMagnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} m/s²", self.0)
    }
}

// ============================================================================
// Shared Snapshot
// ============================================================================

/// The unit stored in the shared sensor state: a sample and its magnitude,
/// always written together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    pub sample: SensorSample,
    pub magnitude: VibrationMagnitude,
}

impl SensorSnapshot {
    pub fn from_sample(sample: SensorSample, gravity: f64) -> Self {
        Self {
            magnitude: sample.magnitude(gravity),
            sample,
        }
    }
}
