//! Vibration Monitor - motor runtime and live vibration telemetry
//!
//! # Usage
//!
//! ```bash
//! # Simulated motor, runtime stored in ./data/runtime.db
//! cargo run --release
//!
//! # Watch the telemetry stream on stdout, nothing written to disk
//! cargo run --release -- --print-telemetry --ephemeral
//!
//! # Faster duty cycle with flaky sensor reads
//! cargo run --release -- --duty-on-secs 12 --duty-off-secs 8 --failure-rate 0.05
//! ```
//!
//! # Environment Variables
//!
//! - `VIBEMON_CONFIG`: Path to a monitor.toml
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vibration_monitor::acquisition::{calibrate, MotorProfile, SensorBus, SimulatedAccelerometer};
use vibration_monitor::config::{defaults, MonitorConfig};
use vibration_monitor::pipeline::{AnalysisLoop, PipelineStats, SamplingLoop};
use vibration_monitor::publish::{BroadcastPublisher, TelemetryPublisher};
use vibration_monitor::storage::{InMemoryRuntimeStore, RuntimeStore, SledRuntimeStore};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "vibration-monitor")]
#[command(about = "Motor runtime inference and live vibration telemetry")]
#[command(version)]
struct CliArgs {
    /// Load configuration from this TOML file (fails hard if invalid)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the runtime store path from the config
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Write 0 to the runtime counter before starting.
    /// WARNING: the accumulated runtime is lost!
    #[arg(long)]
    reset_runtime: bool,

    /// Keep the runtime counter in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Simulated motor: seconds running per duty cycle
    #[arg(long, default_value = "30")]
    duty_on_secs: f64,

    /// Simulated motor: seconds at rest per duty cycle (each cycle starts at rest)
    #[arg(long, default_value = "20")]
    duty_off_secs: f64,

    /// Simulated motor: fundamental vibration frequency (Hz)
    #[arg(long, default_value = "50")]
    vibration_hz: f64,

    /// Simulated sensor: probability that a read fails (0.0-1.0)
    #[arg(long, default_value = "0", value_parser = parse_probability)]
    failure_rate: f64,

    /// Random seed for the simulated sensor
    #[arg(long)]
    seed: Option<u64>,

    /// Attach an observer that prints every telemetry message to stdout
    #[arg(long)]
    print_telemetry: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "VIBEMON_LOG_JSON")]
    log_json: bool,
}

fn parse_probability(raw: &str) -> Result<f64, String> {
    let p: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{raw} is not a probability between 0.0 and 1.0"))
    }
}

// ============================================================================
// Task Supervision
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskExit {
    Sampling { passes: u64 },
    Analysis { runtime_seconds: u64 },
}

impl std::fmt::Display for TaskExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskExit::Sampling { passes } => write!(f, "SamplingLoop ({} passes)", passes),
            TaskExit::Analysis { runtime_seconds } => {
                write!(f, "AnalysisLoop (runtime {} s)", runtime_seconds)
            }
        }
    }
}

/// Wait for shutdown or the first task failure, then drain the set so the
/// analysis loop can write its final checkpoint.
///
/// Returns the final runtime reported by the analysis loop, if it finished.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskExit>>,
    cancel_token: CancellationToken,
) -> Result<Option<u64>> {
    info!("🔒 Supervisor: Both loops spawned, monitoring...");
    let mut runtime_seconds = None;
    let mut failure = None;

    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(exit)) => {
                info!("🔒 Supervisor: Task {} completed", exit);
                if let TaskExit::Analysis { runtime_seconds: s } = exit {
                    runtime_seconds = Some(s);
                }
                if !cancel_token.is_cancelled() {
                    warn!("🔒 Supervisor: Task exited before shutdown, stopping the other");
                    cancel_token.cancel();
                }
            }
            Ok(Err(e)) => {
                error!("🔒 Supervisor: Task failed with error: {}", e);
                cancel_token.cancel();
                failure.get_or_insert(e);
            }
            Err(e) => {
                error!("🔒 Supervisor: Task panicked: {}", e);
                cancel_token.cancel();
                failure.get_or_insert(anyhow::anyhow!("Task panicked: {}", e));
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(runtime_seconds),
    }
}

// ============================================================================
// Startup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(args: &CliArgs) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::load(),
    };
    if let Some(store) = &args.store {
        config.storage.path = store.clone();
    }
    Ok(config)
}

fn open_store(args: &CliArgs, config: &MonitorConfig) -> Result<Arc<dyn RuntimeStore>> {
    let store: Arc<dyn RuntimeStore> = if args.ephemeral {
        info!("💾 Runtime store: in-memory (--ephemeral)");
        Arc::new(InMemoryRuntimeStore::new())
    } else {
        Arc::new(
            SledRuntimeStore::open(&config.storage.path, &config.storage.namespace)
                .with_context(|| {
                    format!(
                        "Failed to open runtime store at {}",
                        config.storage.path.display()
                    )
                })?,
        )
    };

    if args.reset_runtime {
        warn!("⚠️  Resetting accumulated runtime to 0");
        store
            .save_runtime_seconds(0)
            .context("Failed to reset runtime counter")?;
    }
    Ok(store)
}

/// Print every telemetry message until shutdown.
fn spawn_stdout_observer(publisher: &BroadcastPublisher, cancel_token: CancellationToken) {
    let mut rx = publisher.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(text) => println!("{}", text),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "Stdout observer lagging");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    });
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Vibration Monitor v{}", env!("CARGO_PKG_VERSION"));
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = load_config(&args)?;
    let store = open_store(&args, &config)?;
    let accumulated = store
        .load_runtime_seconds()
        .context("Failed to load accumulated runtime")?;
    info!(runtime_secs = accumulated, backend = store.backend_name(), "Runtime loaded");

    let profile = MotorProfile {
        on_secs: args.duty_on_secs,
        off_secs: args.duty_off_secs,
        frequency_hz: args.vibration_hz,
        failure_rate: args.failure_rate,
        ..MotorProfile::default()
    };
    info!(
        on_secs = profile.on_secs,
        off_secs = profile.off_secs,
        frequency_hz = profile.frequency_hz,
        "📥 Input: simulated accelerometer"
    );
    let bus = Arc::new(SensorBus::new(
        Box::new(SimulatedAccelerometer::new(profile, args.seed)),
        config.sensor.gravity,
        config.sensor.lock_timeout(),
    ));

    let calibration = calibrate(&bus, &config.calibration)
        .await
        .context("Startup calibration failed")?;

    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let publisher = Arc::new(BroadcastPublisher::new(defaults::BROADCAST_CAPACITY));
    if args.print_telemetry {
        spawn_stdout_observer(&publisher, cancel_token.clone());
    }
    let stats = Arc::new(PipelineStats::new());

    let sampling = SamplingLoop::new(
        &config,
        Arc::clone(&bus),
        publisher.clone() as Arc<dyn TelemetryPublisher>,
        Arc::clone(&stats),
        cancel_token.clone(),
    );
    let analysis = AnalysisLoop::new(
        &config,
        calibration,
        accumulated,
        Arc::clone(&bus),
        publisher.clone() as Arc<dyn TelemetryPublisher>,
        Arc::clone(&store),
        Arc::clone(&stats),
        cancel_token.clone(),
    )
    .context("Failed to build spectral analyzer")?;

    let mut task_set: JoinSet<Result<TaskExit>> = JoinSet::new();
    task_set.spawn(async move {
        let passes = sampling.run().await;
        Ok(TaskExit::Sampling { passes })
    });
    task_set.spawn(async move {
        let runtime_seconds = analysis.run().await;
        Ok(TaskExit::Analysis { runtime_seconds })
    });

    let outcome = run_supervisor(&mut task_set, cancel_token).await;

    let final_runtime = match &outcome {
        Ok(Some(s)) => *s,
        _ => store.load_runtime_seconds().unwrap_or(accumulated),
    };
    stats.log_final(final_runtime);

    outcome?;
    info!("");
    info!("✓ Vibration Monitor shutdown complete");
    Ok(())
}
