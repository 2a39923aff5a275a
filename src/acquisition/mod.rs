//! Sensor data acquisition module
//!
//! Everything that touches the accelerometer goes through a single
//! [`SensorBus`], which owns the physical port and the shared sensor state
//! behind one mutex with a bounded wait.
//!
//! - `SensorPort`: the hardware seam (real driver, simulation, test script)
//! - `SensorBus`: exclusive bus access + latest-sample cache
//! - `calibrate`: startup noise-floor measurement
//! - `SimulatedAccelerometer`: duty-cycled motor for running without hardware

mod bus;
mod calibration;
pub mod simulated;

pub use bus::SensorBus;
pub use calibration::{calibrate, CalibrationError};
pub use simulated::{MotorProfile, ScriptedSensor, SimulatedAccelerometer};

use thiserror::Error;

use crate::types::SensorSample;

/// Failure of a single hardware transaction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SensorError {
    #[error("Sensor returned no data: {0}")]
    NoData(String),

    #[error("Sensor disconnected")]
    Disconnected,
}

/// Failure of a bus operation. Never fatal to a loop cycle.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BusError {
    #[error("Sensor bus contended, lock not acquired within {waited_ms} ms")]
    Contended { waited_ms: u64 },

    #[error(transparent)]
    Sensor(#[from] SensorError),
}

impl BusError {
    /// True for "try later" lock timeouts, false for hardware failures.
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::Contended { .. })
    }
}

/// One exclusive-access accelerometer.
///
/// `read` is a short blocking transaction. Callers never invoke it directly;
/// the [`SensorBus`] serialises every access.
pub trait SensorPort: Send + 'static {
    fn read(&mut self) -> Result<SensorSample, SensorError>;

    /// Human-readable identifier for logs.
    fn port_name(&self) -> &str;
}
