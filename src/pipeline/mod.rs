//! Monitoring Pipeline Module
//!
//! ## Two-Loop Architecture
//!
//! ```text
//! SamplingLoop (every 100-250 ms)
//!   sensor read ──> shared state ──> "axes" ──> publisher cleanup
//!
//! AnalysisLoop (every 1 s)
//!   shared magnitude ──> classifier tick ──> runtime save (transition / checkpoint)
//!   every 2 ticks:  capture 256 @ 1 kHz ──> Hamming ──> FFT ──> "fft"
//!   every 10 ticks: "runtime"
//! ```
//!
//! Both loops reach the sensor only through the `SensorBus` lock and the
//! publisher only through its own document lock. Neither lock is ever held
//! while waiting for the other.

mod state;
mod schedule;
pub mod sampling_loop;
pub mod analysis_loop;

pub use state::*;
pub use schedule::{TickPlan, TickSchedule};
pub use sampling_loop::{SampleOutcome, SamplingLoop};
pub use analysis_loop::AnalysisLoop;
