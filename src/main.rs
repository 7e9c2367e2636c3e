//! gesture_pilot - fly a small multirotor with hand gestures

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use gesture_pilot::{
    AppConfig, ControlLoop, FrameSource, LogFeedback, NearestSampleModel, ReplayCapture,
    ReplayDetector, StdinKeys,
};
use gesture_pilot_core::{FlightStateMachine, GestureClassifier, MonotonicClock};
use gesture_pilot_sitl::BackendConfig;
use tracing::{error, info, warn};

const DEFAULT_LOG_FILTER: &str = "gesture_pilot=info,gesture_pilot_core=info,gesture_pilot_sitl=info";

#[derive(Parser, Debug)]
#[command(name = "gesture_pilot", about = "Hand-gesture flight control", version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vehicle backend: sim or udp (overrides the config file)
    #[arg(long)]
    backend: Option<String>,

    /// Recorded landmark stream to replay (JSON lines)
    #[arg(long)]
    replay: PathBuf,

    /// Labeled samples for the gesture model (default: the training log)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Where training rows are appended
    #[arg(long)]
    training_log: Option<PathBuf>,

    /// Do not connect to a vehicle
    #[arg(long)]
    no_drone: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    info!("gesture_pilot v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(kind) = &cli.backend {
        if kind != config.backend.kind() {
            config.backend = BackendConfig::from_kind(kind)
                .ok_or_else(|| anyhow!("Unknown backend: {kind}. Use: sim or udp"))?;
        }
    }
    if let Some(path) = cli.training_log {
        config.control.training_log = path;
    }

    let dataset = cli
        .dataset
        .unwrap_or_else(|| config.control.training_log.clone());
    let classifier = if dataset.exists() {
        let model = NearestSampleModel::load(&dataset)?;
        if model.is_empty() {
            warn!("{} has no samples: recording only", dataset.display());
            None
        } else {
            Some(GestureClassifier::new(
                Box::new(model),
                config.gestures.clone(),
            ))
        }
    } else {
        warn!("No dataset at {}: recording only", dataset.display());
        None
    };

    let capture = ReplayCapture::open(&cli.replay)
        .with_context(|| format!("Failed to open replay {}", cli.replay.display()))?;
    let keys = StdinKeys::spawn()?;

    // Connect before frames start flowing
    let flight = if cli.no_drone {
        None
    } else {
        info!("backend: {}", config.backend.kind());
        match FlightStateMachine::connect(config.backend.build(), config.flight.clone()).await {
            Ok(flight) => Some(flight),
            Err(e) => {
                error!("Could not reach vehicle: {}", e);
                None
            }
        }
    };

    let source = match FrameSource::start(capture, &config.frame_source) {
        Ok(source) => source,
        Err(e) => {
            if let Some(flight) = flight {
                let _ = flight.shutdown().await;
            }
            return Err(e.into());
        }
    };

    let mut control = ControlLoop::new(
        source,
        Box::new(ReplayDetector),
        Box::new(LogFeedback::new()),
        Box::new(keys),
        MonotonicClock::new(),
        config.control.clone(),
    );
    if let Some(classifier) = classifier {
        control = control.with_classifier(classifier);
    }
    if let Some(flight) = flight {
        control = control.with_flight(flight);
    }

    let summary = control.run().await;
    info!(
        "{} frames processed, {} gestures dispatched, {} training rows",
        summary.frames_processed, summary.gestures_dispatched, summary.training_rows
    );
    Ok(())
}
