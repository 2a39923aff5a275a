//! System-wide default constants.
//!
//! Every value here is the default of a field in `MonitorConfig`.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Sensor Bus
// ============================================================================

/// Bounded wait for the sensor bus / shared state lock (ms).
pub const SENSOR_LOCK_TIMEOUT_MS: u64 = 10;

/// Gravity offset removed from the Z axis (m/s²).
pub const GRAVITY: f64 = 9.8;

// ============================================================================
// Sampling Loop
// ============================================================================

/// Period of the fast sampling loop (ms). Valid range 100-250.
pub const SAMPLE_INTERVAL_MS: u64 = 250;

/// Bounded wait for the publisher document from the fast loop (ms).
pub const SAMPLING_PUBLISH_TIMEOUT_MS: u64 = 10;

// ============================================================================
// Analysis Loop
// ============================================================================

/// Period of the heavy analysis loop (ms).
pub const ANALYSIS_TICK_MS: u64 = 1_000;

/// Spectrum capture + publish every N analysis ticks.
pub const FFT_EVERY_TICKS: u32 = 2;

/// Runtime publish every N analysis ticks.
pub const RUNTIME_EVERY_TICKS: u32 = 10;

/// Tick counter wraps at this bound. Must be a multiple of both periods above.
pub const TICK_WRAP: u32 = 600;

/// Bounded wait for the publisher document from the analysis loop (ms).
pub const ANALYSIS_PUBLISH_TIMEOUT_MS: u64 = 100;

// ============================================================================
// Spectrum
// ============================================================================

/// Samples per capture window.
pub const FFT_SAMPLES: usize = 256;

/// Effective capture rate (Hz). 1 kHz = 1000 µs between samples.
pub const SAMPLING_FREQUENCY_HZ: f64 = 1_000.0;

/// Non-DC bins published per spectrum.
pub const FFT_BINS_TO_PUBLISH: usize = 64;

// ============================================================================
// Classifier
// ============================================================================

/// Sustained vibration required before reporting ON (s).
pub const ON_DEBOUNCE_SECS: u64 = 3;

/// Sustained quiet required before reporting OFF (s).
pub const OFF_DEBOUNCE_SECS: u64 = 5;

/// Periodic runtime checkpoint while ON (s).
pub const CHECKPOINT_INTERVAL_SECS: u64 = 300;

// ============================================================================
// Calibration
// ============================================================================

/// Length of the startup calibration burst (s).
pub const CALIBRATION_SECS: u64 = 5;

/// Leading part of the burst discarded as settling time (ms).
pub const CALIBRATION_SETTLE_MS: u64 = 500;

/// Delay between calibration reads (ms).
pub const CALIBRATION_POLL_MS: u64 = 100;

// ============================================================================
// Storage & Publisher
// ============================================================================

/// Default sled database path for the runtime counter.
pub const STORE_PATH: &str = "./data/runtime.db";

/// Tree name holding the runtime counter.
pub const STORE_NAMESPACE: &str = "motor-monitor";

/// Messages buffered per observer before the slowest one starts lagging.
pub const BROADCAST_CAPACITY: usize = 64;
