//! Telemetry messages handed to the publisher

use serde::{Deserialize, Serialize};

use super::{round_to, SensorSample};
use crate::processing::Spectrum;

/// One outbound telemetry message.
///
/// Serializes with an internal `type` tag:
/// `{"type":"axes","ax":0.12,"ay":-0.03,"az":0.4,"temp":27.1}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TelemetryMessage {
    /// Latest axes (az gravity-compensated) and temperature
    Axes { ax: f64, ay: f64, az: f64, temp: f64 },
    /// Published spectrum bins
    Fft { freqs: Vec<f64>, mags: Vec<f64> },
    /// Accumulated motor runtime
    Runtime { seconds: u64 },
}

impl TelemetryMessage {
    /// Axes message: 2 decimals for acceleration, 1 for temperature.
    pub fn axes(sample: &SensorSample, gravity: f64) -> Self {
        Self::Axes {
            ax: round_to(sample.ax, 2),
            ay: round_to(sample.ay, 2),
            az: round_to(sample.az_compensated(gravity), 2),
            temp: round_to(sample.temperature, 1),
        }
    }

    /// Spectrum message. Bins are already rounded by the analyzer.
    pub fn fft(spectrum: &Spectrum) -> Self {
        Self::Fft {
            freqs: spectrum.frequencies(),
            mags: spectrum.magnitudes(),
        }
    }

    pub fn runtime(seconds: u64) -> Self {
        Self::Runtime { seconds }
    }

    /// Wire tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Axes { .. } => "axes",
            Self::Fft { .. } => "fft",
            Self::Runtime { .. } => "runtime",
        }
    }
}
