//! Pipeline Integration Tests
//!
//! Runs calibration and both loops against a simulated motor on a paused
//! tokio clock, then checks what reached the store and the telemetry stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use vibration_monitor::acquisition::{
    calibrate, MotorProfile, ScriptedSensor, SensorBus, SimulatedAccelerometer,
};
use vibration_monitor::config::{CalibrationConfig, MonitorConfig};
use vibration_monitor::pipeline::{AnalysisLoop, PipelineStats, SamplingLoop};
use vibration_monitor::publish::{BroadcastPublisher, TelemetryPublisher};
use vibration_monitor::storage::{InMemoryRuntimeStore, RuntimeStore, SledRuntimeStore};
use vibration_monitor::types::{CalibrationProfile, SensorSample, TelemetryMessage, STANDARD_GRAVITY};

fn drain(rx: &mut broadcast::Receiver<Arc<str>>) -> Vec<TelemetryMessage> {
    let mut out = Vec::new();
    while let Ok(text) = rx.try_recv() {
        out.push(serde_json::from_str(&text).expect("telemetry is valid JSON"));
    }
    out
}

/// Motor at rest for the first 10 s of every 30 s cycle, strong vibration after.
fn duty_cycle_motor() -> MotorProfile {
    MotorProfile {
        on_secs: 20.0,
        off_secs: 10.0,
        amplitude: 4.0,
        ..MotorProfile::default()
    }
}

#[tokio::test(start_paused = true)]
async fn duty_cycle_accumulates_runtime_and_publishes_all_kinds() {
    let config = MonitorConfig::default();
    let bus = Arc::new(SensorBus::new(
        Box::new(SimulatedAccelerometer::new(duty_cycle_motor(), Some(7))),
        config.sensor.gravity,
        config.sensor.lock_timeout(),
    ));

    // t = 0..5 s, motor at rest
    let profile = calibrate(&bus, &config.calibration).await.unwrap();
    assert!(profile.noise_floor < 0.5, "noise floor {}", profile.noise_floor);

    let store = Arc::new(InMemoryRuntimeStore::with_initial(100));
    let publisher = Arc::new(BroadcastPublisher::new(1024));
    let mut rx = publisher.subscribe();
    let stats = Arc::new(PipelineStats::new());
    let cancel = CancellationToken::new();

    let sampling = SamplingLoop::new(
        &config,
        Arc::clone(&bus),
        publisher.clone() as Arc<dyn TelemetryPublisher>,
        Arc::clone(&stats),
        cancel.clone(),
    );
    let analysis = AnalysisLoop::new(
        &config,
        profile,
        100,
        Arc::clone(&bus),
        publisher.clone() as Arc<dyn TelemetryPublisher>,
        store.clone() as Arc<dyn RuntimeStore>,
        Arc::clone(&stats),
        cancel.clone(),
    )
    .unwrap();

    let sampling_handle = tokio::spawn(sampling.run());
    let analysis_handle = tokio::spawn(analysis.run());

    // Motor runs 10..30 s and rests again from 30 s; stop at ~39 s
    tokio::time::sleep(Duration::from_secs(34)).await;
    cancel.cancel();
    let passes = sampling_handle.await.unwrap();
    let runtime = analysis_handle.await.unwrap();

    // One save at the OFF transition, no shutdown checkpoint while OFF
    let saved = store.saved_values();
    assert_eq!(saved.len(), 1, "saved: {:?}", saved);
    assert_eq!(saved[0], runtime);
    assert!(
        (110..=130).contains(&runtime),
        "runtime {} outside the expected ON window",
        runtime
    );

    let messages = drain(&mut rx);
    let axes = messages.iter().filter(|m| m.kind() == "axes").count();
    assert_eq!(axes as u64, passes);

    let spectra: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            TelemetryMessage::Fft { freqs, mags } => Some((freqs.len(), mags.len())),
            _ => None,
        })
        .collect();
    assert!(spectra.len() >= 10);
    assert!(spectra.iter().all(|&(f, m)| f == 64 && m == 64));

    let runtimes: Vec<u64> = messages
        .iter()
        .filter_map(|m| match m {
            TelemetryMessage::Runtime { seconds } => Some(*seconds),
            _ => None,
        })
        .collect();
    assert!(runtimes.len() >= 3);
    assert!(runtimes.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(runtimes[0], 100);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.reads_failed, 0);
    assert_eq!(snapshot.saves_ok, 1);
    assert_eq!(snapshot.publishes_dropped, 0);
}

#[tokio::test(start_paused = true)]
async fn runtime_survives_restart_with_sled() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("runtime.db");
    let config = MonitorConfig::default();
    let loud = SensorSample::new(3.0, 0.0, STANDARD_GRAVITY, 30.0);

    let first_session = {
        let store: Arc<dyn RuntimeStore> =
            Arc::new(SledRuntimeStore::open(&db_path, "motor-monitor").unwrap());
        let accumulated = store.load_runtime_seconds().unwrap();
        assert_eq!(accumulated, 0);

        let bus = Arc::new(SensorBus::new(
            Box::new(ScriptedSensor::constant(loud)),
            STANDARD_GRAVITY,
            config.sensor.lock_timeout(),
        ));
        bus.write(loud).await.unwrap();
        let cancel = CancellationToken::new();
        let analysis = AnalysisLoop::new(
            &config,
            CalibrationProfile::from_noise_floor(0.1, 2.0, 0.5),
            accumulated,
            bus,
            Arc::new(BroadcastPublisher::new(64)),
            Arc::clone(&store),
            Arc::new(PipelineStats::new()),
            cancel.clone(),
        )
        .unwrap();

        let handle = tokio::spawn(analysis.run());
        tokio::time::sleep(Duration::from_secs(12)).await;
        cancel.cancel();
        handle.await.unwrap()
    };
    assert!(first_session > 0);

    let reopened = SledRuntimeStore::open(&db_path, "motor-monitor").unwrap();
    let loaded = tokio_test::assert_ok!(reopened.load_runtime_seconds());
    assert_eq!(loaded, first_session);
}

#[test]
fn calibration_on_real_clock_sets_threshold_above_rest_level() {
    let config = CalibrationConfig {
        duration_secs: 1,
        settle_ms: 200,
        poll_interval_ms: 50,
        ..CalibrationConfig::default()
    };
    let bus = SensorBus::new(
        Box::new(ScriptedSensor::constant(SensorSample::new(
            0.3,
            0.0,
            STANDARD_GRAVITY,
            21.0,
        ))),
        STANDARD_GRAVITY,
        Duration::from_millis(10),
    );

    let profile = tokio_test::block_on(calibrate(&bus, &config)).unwrap();
    assert!((profile.noise_floor - 0.3).abs() < 1e-9);
    assert!((profile.threshold - 1.1).abs() < 1e-9);
}
