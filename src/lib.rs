//! Vibration Monitor: motor runtime inference and live vibration telemetry
//!
//! One accelerometer, shared by two concurrent loops.
//!
//! ## Architecture
//!
//! - **Acquisition**: exclusive sensor bus with a bounded-wait lock, shared latest sample
//! - **Classifier**: calibrated threshold + asymmetric debounce, runtime accumulation
//! - **Processing**: Hamming-windowed FFT over 256 magnitudes captured at 1 kHz
//! - **Pipeline**: fast sampling loop and 1 Hz analysis loop
//! - **Storage / Publish**: runtime counter store and telemetry fan-out

pub mod acquisition;
pub mod classifier;
pub mod config;
pub mod pipeline;
pub mod processing;
pub mod publish;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::MonitorConfig;

// Re-export commonly used types
pub use types::{
    CalibrationProfile, SensorSample, SensorSnapshot, TelemetryMessage, VibrationMagnitude,
};

pub use acquisition::{calibrate, CalibrationError, SensorBus, SensorPort};
pub use classifier::{MotorPhase, MotorState, VibrationClassifier};
pub use processing::{SpectralAnalyzer, Spectrum};
pub use publish::{BroadcastPublisher, TelemetryPublisher};
pub use storage::{InMemoryRuntimeStore, RuntimeStore, SledRuntimeStore};
