//! Windowed FFT over captured vibration magnitudes using rustfft
//!
//! `SpectralAnalyzer` is an arena: the plan, the Hamming coefficients and
//! every working buffer are allocated once at construction and reused on
//! each capture/analyze cycle.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use super::{ProcessingError, Spectrum, SpectrumBin};
use crate::acquisition::SensorBus;
use crate::config::SpectrumConfig;
use crate::types::round_to;

/// Outcome of one capture window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// Samples read from the sensor
    pub captured: usize,
    /// Samples replaced by 0 after a contended or failed read
    pub substituted: usize,
    /// Of the substituted samples, how many lost the bus race
    pub contended: usize,
}

impl CaptureReport {
    pub fn is_degraded(&self) -> bool {
        self.substituted > 0
    }
}

pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    sample_rate: f64,
    bins_to_publish: usize,
    sampling_period: std::time::Duration,
    window: Vec<f64>,
    samples: Vec<f64>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralAnalyzer {
    pub fn new(
        size: usize,
        sample_rate: f64,
        bins_to_publish: usize,
    ) -> Result<Self, ProcessingError> {
        if size < 4 || !size.is_power_of_two() {
            return Err(ProcessingError::InvalidWindowSize(size));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ProcessingError::InvalidSamplingRate(sample_rate));
        }
        if bins_to_publish == 0 || bins_to_publish > size / 2 - 1 {
            return Err(ProcessingError::InvalidBinCount {
                requested: bins_to_publish,
                window: size,
            });
        }

        let sampling_period = std::time::Duration::from_secs_f64(1.0 / sample_rate);
        if sampling_period.is_zero() {
            return Err(ProcessingError::InvalidSamplingRate(sample_rate));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        // Hamming: 0.54 - 0.46 cos(2πi / (N-1))
        let denom = (size - 1) as f64;
        let window = (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
            .collect();

        Ok(Self {
            fft,
            size,
            sample_rate,
            bins_to_publish,
            sampling_period,
            window,
            samples: vec![0.0; size],
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
        })
    }

    pub fn from_config(config: &SpectrumConfig) -> Result<Self, ProcessingError> {
        let mut analyzer = Self::new(
            config.sample_count,
            config.sample_rate_hz,
            config.bins_to_publish,
        )?;
        let period = config.sampling_period();
        if period.is_zero() {
            return Err(ProcessingError::InvalidSamplingRate(config.sample_rate_hz));
        }
        analyzer.sampling_period = period;
        Ok(analyzer)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn frequency_resolution(&self) -> f64 {
        self.sample_rate / self.size as f64
    }

    /// Fill the sample buffer with `N` magnitudes on a fixed grid.
    ///
    /// Each read goes through the bus lock. A read that cannot get the bus,
    /// or that fails, stores 0 in its slot; the buffer is always full.
    pub async fn capture(&mut self, bus: &SensorBus) -> CaptureReport {
        self.samples.fill(0.0);
        let mut report = CaptureReport::default();
        let mut grid = interval(self.sampling_period);
        // A late read pushes the rest of the window back rather than bunching samples
        grid.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for slot in self.samples.iter_mut() {
            grid.tick().await;
            match bus.read_magnitude().await {
                Ok(m) => {
                    *slot = m.value();
                    report.captured += 1;
                }
                Err(e) => {
                    report.substituted += 1;
                    if e.is_contention() {
                        report.contended += 1;
                    }
                    trace!(error = %e, "Capture sample substituted with 0");
                }
            }
        }

        if report.is_degraded() {
            debug!(
                captured = report.captured,
                substituted = report.substituted,
                contended = report.contended,
                "Degraded spectrum capture"
            );
        }
        report
    }

    /// Transform the last captured window.
    pub fn analyze_captured(&mut self) -> Spectrum {
        self.transform()
    }

    /// Transform an externally supplied window of exactly `N` samples.
    pub fn analyze(&mut self, samples: &[f64]) -> Result<Spectrum, ProcessingError> {
        if samples.len() != self.size {
            return Err(ProcessingError::LengthMismatch {
                expected: self.size,
                actual: samples.len(),
            });
        }
        self.samples.copy_from_slice(samples);
        Ok(self.transform())
    }

    fn transform(&mut self) -> Spectrum {
        for ((c, &x), &w) in self.buffer.iter_mut().zip(&self.samples).zip(&self.window) {
            *c = Complex::new(x * w, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let resolution = self.frequency_resolution();
        let bins = self.buffer[1..=self.bins_to_publish]
            .iter()
            .enumerate()
            .map(|(i, c)| SpectrumBin {
                frequency: round_to((i + 1) as f64 * resolution, 1),
                magnitude: round_to(c.norm(), 2),
            })
            .collect();

        Spectrum {
            bins,
            sample_rate: self.sample_rate,
            resolution,
        }
    }
}
