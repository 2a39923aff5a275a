//! Startup calibration: measure the at-rest noise floor through the sensor bus

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::SensorBus;
use crate::config::CalibrationConfig;
use crate::types::CalibrationProfile;

/// Calibration could not produce a profile. Fatal at startup.
#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("Sensor unavailable during calibration: {attempts} reads after settling, none succeeded")]
    SensorUnavailable { attempts: u32 },
}

/// Sample the bus for the configured window and derive the detection threshold.
///
/// Reads taken during the leading settle period are discarded. Failed or
/// contended reads are skipped; the profile is the mean of whatever
/// succeeded, and only a window with no usable sample is an error.
pub async fn calibrate(
    bus: &SensorBus,
    config: &CalibrationConfig,
) -> Result<CalibrationProfile, CalibrationError> {
    info!(
        duration_secs = config.duration_secs,
        settle_ms = config.settle_ms,
        "Calibrating noise floor, keep the motor at rest"
    );

    let start = Instant::now();
    let mut magnitudes = Vec::new();
    let mut attempts = 0u32;
    let mut failures = 0u32;

    while start.elapsed() < config.duration() {
        let settling = start.elapsed() < config.settle();
        match bus.sample().await {
            Ok(_) if settling => {}
            Ok(snapshot) => magnitudes.push(snapshot.magnitude.value()),
            Err(e) => {
                if !settling {
                    failures += 1;
                }
                debug!(error = %e, settling, "Calibration read failed");
            }
        }
        if !settling {
            attempts += 1;
        }
        sleep(config.poll_interval()).await;
    }

    let profile = CalibrationProfile::from_samples(
        &magnitudes,
        config.threshold_multiplier,
        config.threshold_offset,
    )
    .ok_or(CalibrationError::SensorUnavailable { attempts })?;

    if failures > 0 {
        warn!(failures, attempts, "Some calibration reads failed");
    }
    info!(
        noise_floor = format!("{:.4}", profile.noise_floor),
        threshold = format!("{:.4}", profile.threshold),
        samples = magnitudes.len(),
        "Calibration complete"
    );
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::ScriptedSensor;
    use crate::types::{SensorSample, STANDARD_GRAVITY};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn bus(port: ScriptedSensor) -> SensorBus {
        SensorBus::new(Box::new(port), STANDARD_GRAVITY, Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_constant_noise_gives_exact_threshold() {
        let bus = bus(ScriptedSensor::constant(SensorSample::new(
            0.3,
            0.4,
            STANDARD_GRAVITY,
            22.0,
        )));
        let profile = calibrate(&bus, &CalibrationConfig::default()).await.unwrap();
        assert!((profile.noise_floor - 0.5).abs() < 1e-12);
        assert_eq!(profile.threshold, profile.noise_floor * 2.0 + 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settling_reads_are_discarded() {
        // Large spike during the first 500 ms, quiet afterwards
        let start = Instant::now();
        let port = ScriptedSensor::new(move || {
            let ax = if start.elapsed() < Duration::from_millis(500) { 50.0 } else { 0.2 };
            Ok(SensorSample::new(ax, 0.0, STANDARD_GRAVITY, 22.0))
        });
        let profile = calibrate(&bus(port), &CalibrationConfig::default()).await.unwrap();
        assert!((profile.noise_floor - 0.2).abs() < 1e-12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_length_and_poll_rate() {
        let reads = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&reads);
        let port = ScriptedSensor::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(SensorSample::new(0.1, 0.0, STANDARD_GRAVITY, 22.0))
        });

        let start = Instant::now();
        calibrate(&bus(port), &CalibrationConfig::default()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
        // 5 s window polled every 100 ms
        assert_eq!(reads.load(Ordering::SeqCst), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_sensor_is_startup_failure() {
        let err = calibrate(&bus(ScriptedSensor::failing()), &CalibrationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, CalibrationError::SensorUnavailable { attempts: 45 });
    }
}
