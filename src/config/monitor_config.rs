//! Monitor Configuration - every timing and threshold constant as a TOML value
//!
//! Each section implements `Default` with the firmware constants,
//! so running without a config file reproduces the reference behaviour.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "VIBEMON_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "monitor.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one monitored motor.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$VIBEMON_CONFIG` env var
/// 2. `./monitor.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub spectrum: SpectrumConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl MonitorConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded monitor config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded monitor config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings; range violations are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check internal consistency. Collects every violation before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Sensor bus access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Bounded wait for the shared bus/state lock (ms)
    #[serde(default = "default_sensor_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Gravity offset removed from the Z axis (m/s²)
    #[serde(default = "default_gravity")]
    pub gravity: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: defaults::SENSOR_LOCK_TIMEOUT_MS,
            gravity: defaults::GRAVITY,
        }
    }
}

impl SensorConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Fast loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_sample_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_sampling_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::SAMPLE_INTERVAL_MS,
            publish_timeout_ms: defaults::SAMPLING_PUBLISH_TIMEOUT_MS,
        }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

/// Heavy loop cadence and its sub-schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_tick_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_fft_every_ticks")]
    pub fft_every_ticks: u32,
    #[serde(default = "default_runtime_every_ticks")]
    pub runtime_every_ticks: u32,
    #[serde(default = "default_tick_wrap")]
    pub tick_wrap: u32,
    #[serde(default = "default_analysis_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: defaults::ANALYSIS_TICK_MS,
            fft_every_ticks: defaults::FFT_EVERY_TICKS,
            runtime_every_ticks: defaults::RUNTIME_EVERY_TICKS,
            tick_wrap: defaults::TICK_WRAP,
            publish_timeout_ms: defaults::ANALYSIS_PUBLISH_TIMEOUT_MS,
        }
    }
}

impl AnalysisConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

/// Capture window and published bins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Samples per window (power of two)
    #[serde(default = "default_fft_samples")]
    pub sample_count: usize,
    #[serde(default = "default_sampling_frequency_hz")]
    pub sample_rate_hz: f64,
    /// Non-DC bins published per spectrum
    #[serde(default = "default_fft_bins_to_publish")]
    pub bins_to_publish: usize,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            sample_count: defaults::FFT_SAMPLES,
            sample_rate_hz: defaults::SAMPLING_FREQUENCY_HZ,
            bins_to_publish: defaults::FFT_BINS_TO_PUBLISH,
        }
    }
}

impl SpectrumConfig {
    /// Spacing of the capture grid, rounded to whole microseconds.
    pub fn sampling_period(&self) -> Duration {
        Duration::from_micros((1_000_000.0 / self.sample_rate_hz).round() as u64)
    }
}

/// Debounce and checkpoint timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_on_debounce_secs")]
    pub on_debounce_secs: u64,
    #[serde(default = "default_off_debounce_secs")]
    pub off_debounce_secs: u64,
    #[serde(default = "default_checkpoint_interval_secs")]
    pub checkpoint_interval_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            on_debounce_secs: defaults::ON_DEBOUNCE_SECS,
            off_debounce_secs: defaults::OFF_DEBOUNCE_SECS,
            checkpoint_interval_secs: defaults::CHECKPOINT_INTERVAL_SECS,
        }
    }
}

/// Startup noise-floor measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default = "default_calibration_secs")]
    pub duration_secs: u64,
    #[serde(default = "default_calibration_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_calibration_poll_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_threshold_multiplier")]
    pub threshold_multiplier: f64,
    #[serde(default = "default_threshold_offset")]
    pub threshold_offset: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_secs: defaults::CALIBRATION_SECS,
            settle_ms: defaults::CALIBRATION_SETTLE_MS,
            poll_interval_ms: defaults::CALIBRATION_POLL_MS,
            threshold_multiplier: crate::types::THRESHOLD_MULTIPLIER,
            threshold_offset: crate::types::THRESHOLD_ADDER,
        }
    }
}

impl CalibrationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Runtime counter store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_store_namespace")]
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            namespace: default_store_namespace(),
        }
    }
}

// ============================================================================
// Serde default helpers
// ============================================================================

fn default_sensor_lock_timeout_ms() -> u64 { defaults::SENSOR_LOCK_TIMEOUT_MS }
fn default_gravity() -> f64 { defaults::GRAVITY }
fn default_sample_interval_ms() -> u64 { defaults::SAMPLE_INTERVAL_MS }
fn default_sampling_publish_timeout_ms() -> u64 { defaults::SAMPLING_PUBLISH_TIMEOUT_MS }
fn default_analysis_tick_ms() -> u64 { defaults::ANALYSIS_TICK_MS }
fn default_fft_every_ticks() -> u32 { defaults::FFT_EVERY_TICKS }
fn default_runtime_every_ticks() -> u32 { defaults::RUNTIME_EVERY_TICKS }
fn default_tick_wrap() -> u32 { defaults::TICK_WRAP }
fn default_analysis_publish_timeout_ms() -> u64 { defaults::ANALYSIS_PUBLISH_TIMEOUT_MS }
fn default_fft_samples() -> usize { defaults::FFT_SAMPLES }
fn default_sampling_frequency_hz() -> f64 { defaults::SAMPLING_FREQUENCY_HZ }
fn default_fft_bins_to_publish() -> usize { defaults::FFT_BINS_TO_PUBLISH }
fn default_on_debounce_secs() -> u64 { defaults::ON_DEBOUNCE_SECS }
fn default_off_debounce_secs() -> u64 { defaults::OFF_DEBOUNCE_SECS }
fn default_checkpoint_interval_secs() -> u64 { defaults::CHECKPOINT_INTERVAL_SECS }
fn default_calibration_secs() -> u64 { defaults::CALIBRATION_SECS }
fn default_calibration_settle_ms() -> u64 { defaults::CALIBRATION_SETTLE_MS }
fn default_calibration_poll_ms() -> u64 { defaults::CALIBRATION_POLL_MS }
fn default_threshold_multiplier() -> f64 { crate::types::THRESHOLD_MULTIPLIER }
fn default_threshold_offset() -> f64 { crate::types::THRESHOLD_ADDER }
fn default_store_path() -> PathBuf { PathBuf::from(defaults::STORE_PATH) }
fn default_store_namespace() -> String { defaults::STORE_NAMESPACE.to_string() }

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}
