//! Shared pipeline counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Counters updated by both loops. Relaxed ordering: they are reporting
/// data, never used for synchronisation.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub reads_ok: AtomicU64,
    pub reads_failed: AtomicU64,
    pub reads_contended: AtomicU64,
    pub analysis_ticks: AtomicU64,
    pub stale_ticks: AtomicU64,
    pub spectra: AtomicU64,
    pub degraded_captures: AtomicU64,
    pub substituted_samples: AtomicU64,
    pub publishes_ok: AtomicU64,
    pub publishes_dropped: AtomicU64,
    pub saves_ok: AtomicU64,
    pub saves_failed: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub reads_ok: u64,
    pub reads_failed: u64,
    pub reads_contended: u64,
    pub analysis_ticks: u64,
    pub stale_ticks: u64,
    pub spectra: u64,
    pub degraded_captures: u64,
    pub substituted_samples: u64,
    pub publishes_ok: u64,
    pub publishes_dropped: u64,
    pub saves_ok: u64,
    pub saves_failed: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            reads_ok: get(&self.reads_ok),
            reads_failed: get(&self.reads_failed),
            reads_contended: get(&self.reads_contended),
            analysis_ticks: get(&self.analysis_ticks),
            stale_ticks: get(&self.stale_ticks),
            spectra: get(&self.spectra),
            degraded_captures: get(&self.degraded_captures),
            substituted_samples: get(&self.substituted_samples),
            publishes_ok: get(&self.publishes_ok),
            publishes_dropped: get(&self.publishes_dropped),
            saves_ok: get(&self.saves_ok),
            saves_failed: get(&self.saves_failed),
        }
    }

    pub fn log_final(&self, runtime_seconds: u64) {
        let s = self.snapshot();
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("📊 FINAL STATISTICS");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("   Sensor Reads:         {} ok / {} failed / {} contended", s.reads_ok, s.reads_failed, s.reads_contended);
        info!("   Analysis Ticks:       {} ({} on stale magnitude)", s.analysis_ticks, s.stale_ticks);
        info!("   Spectra:              {} ({} degraded, {} samples zeroed)", s.spectra, s.degraded_captures, s.substituted_samples);
        info!("   Publishes:            {} ok / {} dropped", s.publishes_ok, s.publishes_dropped);
        info!("   Runtime Saves:        {} ok / {} failed", s.saves_ok, s.saves_failed);
        info!("   Accumulated Runtime:  {} s", runtime_seconds);
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
}
