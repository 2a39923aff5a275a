//! Fast loop: sample the sensor, refresh the shared state, publish axes.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::PipelineStats;
use crate::acquisition::SensorBus;
use crate::config::MonitorConfig;
use crate::publish::TelemetryPublisher;
use crate::types::{SensorSample, TelemetryMessage};

/// Result of one fast-loop pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Fresh reading stored and published
    Fresh,
    /// Read failed or bus contended; the previous reading was published
    Stale,
    /// Read failed and nothing was ever read
    Empty,
}

pub struct SamplingLoop {
    bus: Arc<SensorBus>,
    publisher: Arc<dyn TelemetryPublisher>,
    stats: Arc<PipelineStats>,
    cancel_token: CancellationToken,
    interval: Duration,
    publish_timeout: Duration,
    last_sample: Option<SensorSample>,
}

impl SamplingLoop {
    pub fn new(
        config: &MonitorConfig,
        bus: Arc<SensorBus>,
        publisher: Arc<dyn TelemetryPublisher>,
        stats: Arc<PipelineStats>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            bus,
            publisher,
            stats,
            cancel_token,
            interval: config.sampling.interval(),
            publish_timeout: config.sampling.publish_timeout(),
            last_sample: None,
        }
    }

    /// Run passes on the fixed cadence until cancelled. Returns the pass count.
    pub async fn run(mut self) -> u64 {
        info!(interval_ms = self.interval.as_millis() as u64, "[SamplingLoop] Task starting");
        let mut passes = 0u64;

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!(passes, "[SamplingLoop] Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {}
            }

            self.run_cycle().await;
            passes += 1;
        }

        passes
    }

    /// One pass: read, publish, housekeeping.
    pub async fn run_cycle(&mut self) -> SampleOutcome {
        let outcome = match self.bus.sample().await {
            Ok(snapshot) => {
                PipelineStats::incr(&self.stats.reads_ok);
                self.last_sample = Some(snapshot.sample);
                SampleOutcome::Fresh
            }
            Err(e) => {
                if e.is_contention() {
                    PipelineStats::incr(&self.stats.reads_contended);
                } else {
                    PipelineStats::incr(&self.stats.reads_failed);
                }
                debug!(error = %e, "[SamplingLoop] Read unsuccessful, publishing stale sample");
                if self.last_sample.is_some() {
                    SampleOutcome::Stale
                } else {
                    SampleOutcome::Empty
                }
            }
        };

        if let Some(sample) = self.last_sample {
            let message = TelemetryMessage::axes(&sample, self.bus.gravity());
            match self.publisher.publish(&message, self.publish_timeout).await {
                Ok(_) => PipelineStats::incr(&self.stats.publishes_ok),
                Err(e) => {
                    PipelineStats::incr(&self.stats.publishes_dropped);
                    warn!(error = %e, "[SamplingLoop] Axes publish dropped");
                }
            }
        }

        self.publisher.cleanup();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{ScriptedSensor, SensorError};
    use crate::publish::BroadcastPublisher;
    use crate::types::STANDARD_GRAVITY;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn setup(port: ScriptedSensor) -> (SamplingLoop, Arc<BroadcastPublisher>, Arc<SensorBus>) {
        let config = MonitorConfig::default();
        let bus = Arc::new(SensorBus::new(
            Box::new(port),
            STANDARD_GRAVITY,
            config.sensor.lock_timeout(),
        ));
        let publisher = Arc::new(BroadcastPublisher::new(16));
        let sampler = SamplingLoop::new(
            &config,
            Arc::clone(&bus),
            publisher.clone(),
            Arc::new(PipelineStats::new()),
            CancellationToken::new(),
        );
        (sampler, publisher, bus)
    }

    #[tokio::test]
    async fn test_nothing_published_before_first_read() {
        let (mut sampler, publisher, _) = setup(ScriptedSensor::failing());
        let mut rx = publisher.subscribe();
        assert_eq!(sampler.run_cycle().await, SampleOutcome::Empty);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_read_republishes_stale_axes() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let port = ScriptedSensor::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(SensorSample::new(0.123, 0.0, 10.0, 25.04))
            } else {
                Err(SensorError::Disconnected)
            }
        });
        let (mut sampler, publisher, bus) = setup(port);
        let mut rx = publisher.subscribe();

        assert_eq!(sampler.run_cycle().await, SampleOutcome::Fresh);
        assert_eq!(sampler.run_cycle().await, SampleOutcome::Stale);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first, second);
        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["type"], "axes");
        assert_eq!(value["ax"], 0.12);
        assert_eq!(value["az"], 0.2);
        assert_eq!(value["temp"], 25.0);

        // Shared state still holds the first reading
        let snap = bus.try_read().await.unwrap().unwrap();
        assert_eq!(snap.sample.ax, 0.123);
        assert_eq!(sampler.stats.snapshot().reads_failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let (sampler, _publisher, _) = setup(ScriptedSensor::constant(SensorSample::new(
            0.0,
            0.0,
            STANDARD_GRAVITY,
            20.0,
        )));
        let token = sampler.cancel_token.clone();
        let handle = tokio::spawn(sampler.run());

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        token.cancel();
        let passes = handle.await.unwrap();
        // Passes at 0, 250, 500, 750, 1000 ms
        assert_eq!(passes, 5);
    }
}
