//! Heavy loop: classifier tick, periodic spectrum, runtime publication.
//!
//! Per tick, strictly in this order:
//! 1. classifier tick on the latest shared magnitude (persist if asked)
//! 2. every `fft_every_ticks`: capture + analyze + publish "fft"
//! 3. every `runtime_every_ticks`: publish "runtime"

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{PipelineStats, TickSchedule};
use crate::acquisition::SensorBus;
use crate::classifier::{ClassifierSettings, TickOutcome, VibrationClassifier};
use crate::config::MonitorConfig;
use crate::processing::{ProcessingError, SpectralAnalyzer};
use crate::publish::TelemetryPublisher;
use crate::storage::RuntimeStore;
use crate::types::{CalibrationProfile, TelemetryMessage, VibrationMagnitude};

pub struct AnalysisLoop {
    bus: Arc<SensorBus>,
    publisher: Arc<dyn TelemetryPublisher>,
    store: Arc<dyn RuntimeStore>,
    stats: Arc<PipelineStats>,
    cancel_token: CancellationToken,
    classifier: VibrationClassifier,
    analyzer: SpectralAnalyzer,
    schedule: TickSchedule,
    tick_interval: Duration,
    publish_timeout: Duration,
    /// Last magnitude read from the shared state, reused when it is contended
    last_magnitude: VibrationMagnitude,
}

impl AnalysisLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &MonitorConfig,
        profile: CalibrationProfile,
        accumulated_seconds: u64,
        bus: Arc<SensorBus>,
        publisher: Arc<dyn TelemetryPublisher>,
        store: Arc<dyn RuntimeStore>,
        stats: Arc<PipelineStats>,
        cancel_token: CancellationToken,
    ) -> Result<Self, ProcessingError> {
        let classifier = VibrationClassifier::new(
            profile,
            ClassifierSettings::from_config(&config.classifier),
            accumulated_seconds,
            tokio::time::Instant::now().into_std(),
        );

        Ok(Self {
            bus,
            publisher,
            store,
            stats,
            cancel_token,
            classifier,
            analyzer: SpectralAnalyzer::from_config(&config.spectrum)?,
            schedule: TickSchedule::from_config(&config.analysis),
            tick_interval: config.analysis.tick_interval(),
            publish_timeout: config.analysis.publish_timeout(),
            last_magnitude: VibrationMagnitude::ZERO,
        })
    }

    pub fn classifier(&self) -> &VibrationClassifier {
        &self.classifier
    }

    /// Run ticks on the fixed cadence until cancelled.
    ///
    /// On shutdown the runtime is checkpointed once more if the motor is ON.
    /// Returns the final accumulated runtime.
    pub async fn run(mut self) -> u64 {
        info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            threshold = format!("{:.3}", self.classifier.profile().threshold),
            runtime_secs = self.classifier.state().accumulated_seconds,
            "[AnalysisLoop] Task starting"
        );

        // Fixed cadence: the capture runs inside the period, not after it
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("[AnalysisLoop] Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {}
            }

            self.run_tick().await;
        }

        let state = self.classifier.state();
        if state.is_on() {
            self.persist(state.accumulated_seconds, "shutdown");
        }
        state.accumulated_seconds
    }

    /// One analysis tick.
    pub async fn run_tick(&mut self) -> TickOutcome {
        PipelineStats::incr(&self.stats.analysis_ticks);

        match self.bus.try_read().await {
            Ok(Some(snapshot)) => self.last_magnitude = snapshot.magnitude,
            Ok(None) => PipelineStats::incr(&self.stats.stale_ticks),
            Err(e) => {
                PipelineStats::incr(&self.stats.stale_ticks);
                debug!(error = %e, "[AnalysisLoop] Shared state contended, using last magnitude");
            }
        }

        let now = tokio::time::Instant::now().into_std();
        let outcome = self.classifier.tick(self.last_magnitude, now);
        if let Some(reason) = outcome.persist {
            self.persist(outcome.accumulated_seconds, reason.as_str());
        }

        let plan = self.schedule.next_plan();

        if plan.run_spectrum {
            let report = self.analyzer.capture(&self.bus).await;
            PipelineStats::incr(&self.stats.spectra);
            if report.is_degraded() {
                PipelineStats::incr(&self.stats.degraded_captures);
                PipelineStats::add(&self.stats.substituted_samples, report.substituted as u64);
            }
            let spectrum = self.analyzer.analyze_captured();
            self.publish(&TelemetryMessage::fft(&spectrum)).await;
        }

        if plan.publish_runtime {
            self.publish(&TelemetryMessage::runtime(outcome.accumulated_seconds))
                .await;
        }

        outcome
    }

    fn persist(&self, seconds: u64, reason: &str) {
        match self.store.save_runtime_seconds(seconds) {
            Ok(()) => {
                PipelineStats::incr(&self.stats.saves_ok);
                info!(
                    runtime_secs = seconds,
                    reason,
                    backend = self.store.backend_name(),
                    "Runtime saved"
                );
            }
            Err(e) => {
                PipelineStats::incr(&self.stats.saves_failed);
                warn!(runtime_secs = seconds, reason, error = %e, "Runtime save failed");
            }
        }
    }

    async fn publish(&self, message: &TelemetryMessage) {
        match self.publisher.publish(message, self.publish_timeout).await {
            Ok(_) => PipelineStats::incr(&self.stats.publishes_ok),
            Err(e) => {
                PipelineStats::incr(&self.stats.publishes_dropped);
                warn!(kind = message.kind(), error = %e, "[AnalysisLoop] Publish dropped");
            }
        }
    }
}
