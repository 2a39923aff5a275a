//! Signal processing module - spectral analysis of the vibration magnitude

mod fft;

pub use fft::{CaptureReport, SpectralAnalyzer};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in signal processing
#[derive(Error, Debug, PartialEq)]
pub enum ProcessingError {
    #[error("Buffer length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),

    #[error("Invalid window size {0}: must be a power of two >= 4")]
    InvalidWindowSize(usize),

    #[error("Cannot publish {requested} bins from a {window}-sample window")]
    InvalidBinCount { requested: usize, window: usize },
}

/// One published spectral bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumBin {
    /// Bin centre (Hz), 1 decimal
    pub frequency: f64,
    /// |X[k]|, 2 decimals
    pub magnitude: f64,
}

/// Published part of one spectrum: bins 1..=K, DC excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub bins: Vec<SpectrumBin>,
    /// Sample rate used (Hz)
    pub sample_rate: f64,
    /// Hz per bin (sample_rate / N)
    pub resolution: f64,
}

impl Spectrum {
    pub fn frequencies(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.frequency).collect()
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.magnitude).collect()
    }

    /// Strongest published bin, `None` for an empty spectrum.
    pub fn peak(&self) -> Option<&SpectrumBin> {
        self.bins
            .iter()
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}
