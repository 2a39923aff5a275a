//! Monitor Configuration Module
//!
//! Every timing constant of the monitor, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `VIBEMON_CONFIG` environment variable (path to TOML file)
//! 2. `monitor.toml` in the current working directory
//! 3. Built-in defaults (the firmware constants)
//!
//! The loaded `MonitorConfig` is handed to each component at construction;
//! nothing reads configuration from a global.

mod monitor_config;
pub mod defaults;
pub mod validation;

pub use monitor_config::*;
