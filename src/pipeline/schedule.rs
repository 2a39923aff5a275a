//! Analysis tick schedule

use crate::config::AnalysisConfig;

/// What the analysis loop runs on a given tick, besides the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub counter: u32,
    pub run_spectrum: bool,
    pub publish_runtime: bool,
}

/// Wrapping tick counter driving the modulo sub-schedules.
///
/// The wrap bound is a common multiple of both periods, so wrapping back to
/// 0 lands on a tick where both would fire anyway and the cadence is exact.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    counter: u32,
    spectrum_every: u32,
    runtime_every: u32,
    wrap: u32,
}

impl TickSchedule {
    pub fn new(spectrum_every: u32, runtime_every: u32, wrap: u32) -> Self {
        Self {
            counter: 0,
            spectrum_every: spectrum_every.max(1),
            runtime_every: runtime_every.max(1),
            wrap: wrap.max(1),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.fft_every_ticks,
            config.runtime_every_ticks,
            config.tick_wrap,
        )
    }

    /// Plan for the current tick, then advance the counter.
    pub fn next_plan(&mut self) -> TickPlan {
        let plan = TickPlan {
            counter: self.counter,
            run_spectrum: self.counter % self.spectrum_every == 0,
            publish_runtime: self.counter % self.runtime_every == 0,
        };
        self.counter = (self.counter + 1) % self.wrap;
        plan
    }
}

impl Default for TickSchedule {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}
