//! Simulated sensor ports
//!
//! `SimulatedAccelerometer` stands in for the real driver: an at-rest signal
//! biased by gravity with Gaussian noise, plus a motor vibration during the
//! ON part of a repeating duty cycle. `ScriptedSensor` replays a closure and
//! is what the tests wire into the bus.

use rand::prelude::*;
use rand_distr::StandardNormal;
use std::f64::consts::PI;
use tokio::time::Instant;

use super::{SensorError, SensorPort};
use crate::types::{SensorSample, STANDARD_GRAVITY};

// ============================================================================
// Motor Profile
// ============================================================================

/// Shape of the simulated machine.
#[derive(Debug, Clone)]
pub struct MotorProfile {
    /// Seconds the motor runs per cycle (0 = never runs)
    pub on_secs: f64,
    /// Seconds the motor rests per cycle; each cycle starts at rest
    pub off_secs: f64,
    /// Fundamental vibration frequency while running (Hz)
    pub frequency_hz: f64,
    /// Vibration amplitude while running (m/s²)
    pub amplitude: f64,
    /// Standard deviation of the at-rest noise on every axis (m/s²)
    pub noise_std: f64,
    /// Probability that a read fails, 0.0..=1.0
    pub failure_rate: f64,
}

impl Default for MotorProfile {
    fn default() -> Self {
        Self {
            on_secs: 30.0,
            off_secs: 20.0,
            frequency_hz: 50.0,
            amplitude: 2.0,
            noise_std: 0.05,
            failure_rate: 0.0,
        }
    }
}

impl MotorProfile {
    /// `failure_rate` clamped to 0.0..=1.0; NaN counts as never failing.
    pub fn failure_probability(&self) -> f64 {
        if self.failure_rate.is_nan() {
            0.0
        } else {
            self.failure_rate.clamp(0.0, 1.0)
        }
    }

    /// Whether the motor runs `elapsed` seconds after the simulation started.
    pub fn is_running_at(&self, elapsed: f64) -> bool {
        if self.on_secs <= 0.0 {
            return false;
        }
        let period = self.on_secs + self.off_secs.max(0.0);
        elapsed.rem_euclid(period) >= self.off_secs
    }
}

// ============================================================================
// Simulated Accelerometer
// ============================================================================

pub struct SimulatedAccelerometer {
    profile: MotorProfile,
    rng: StdRng,
    started: Instant,
    reads: u64,
}

impl SimulatedAccelerometer {
    pub fn new(profile: MotorProfile, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            profile,
            rng,
            started: Instant::now(),
            reads: 0,
        }
    }

    pub fn profile(&self) -> &MotorProfile {
        &self.profile
    }

    fn noise(&mut self) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * self.profile.noise_std
    }
}

impl SensorPort for SimulatedAccelerometer {
    fn read(&mut self) -> Result<SensorSample, SensorError> {
        self.reads += 1;
        if self.rng.gen_bool(self.profile.failure_probability()) {
            return Err(SensorError::NoData(format!("injected failure on read {}", self.reads)));
        }

        let now = Instant::now();
        let t = now.duration_since(self.started).as_secs_f64();

        let (mut ax, mut ay, mut az) = (self.noise(), self.noise(), STANDARD_GRAVITY + self.noise());
        let mut temperature = 24.0 + self.noise();

        if self.profile.is_running_at(t) {
            let phase = 2.0 * PI * self.profile.frequency_hz * t;
            let a = self.profile.amplitude;
            ax += a * phase.sin();
            ay += 0.5 * a * phase.cos();
            az += 0.3 * a * (2.0 * phase).sin();
            temperature += 8.0;
        }

        Ok(SensorSample::with_timestamp(ax, ay, az, temperature, now.into_std()))
    }

    fn port_name(&self) -> &str {
        "simulated-accelerometer"
    }
}

// ============================================================================
// Scripted Sensor
// ============================================================================

type ReadFn = Box<dyn FnMut() -> Result<SensorSample, SensorError> + Send>;

/// Sensor port driven by a closure.
pub struct ScriptedSensor {
    read_fn: ReadFn,
}

impl ScriptedSensor {
    pub fn new<F>(read_fn: F) -> Self
    where
        F: FnMut() -> Result<SensorSample, SensorError> + Send + 'static,
    {
        Self {
            read_fn: Box::new(read_fn),
        }
    }

    /// Always returns the same axes, freshly stamped.
    pub fn constant(sample: SensorSample) -> Self {
        Self::new(move || {
            Ok(SensorSample::new(
                sample.ax,
                sample.ay,
                sample.az,
                sample.temperature,
            ))
        })
    }

    /// Every read fails.
    pub fn failing() -> Self {
        Self::new(|| Err(SensorError::NoData("scripted failure".to_string())))
    }
}

impl SensorPort for ScriptedSensor {
    fn read(&mut self) -> Result<SensorSample, SensorError> {
        (self.read_fn)()
    }

    fn port_name(&self) -> &str {
        "scripted"
    }
}
