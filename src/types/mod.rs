//! Shared data structures for the vibration sensing pipeline
//!
//! - `SensorSample` / `VibrationMagnitude`: raw readings and the derived signal
//! - `SensorSnapshot`: the unit held in the shared sensor state
//! - `CalibrationProfile`: noise floor and detection threshold
//! - `TelemetryMessage`: what the two loops hand to the publisher

mod calibration;
mod sample;
mod telemetry;

pub use calibration::*;
pub use sample::*;
pub use telemetry::*;

/// Round to a fixed number of decimals for publication.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::round_to;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.90625, 1), 3.9);
        assert_eq!(round_to(1.005_1, 2), 1.01);
        assert_eq!(round_to(-0.044, 2), -0.04);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
