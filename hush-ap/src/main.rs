//! Hush audio player (hush-ap) - Main entry point
//!
//! Runs one playback session against a real audio device (or the silent
//! null sink), optionally arms the sleep timer, and logs every engine event
//! until interrupted or until the sleep timer expires.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use hush_ap::audio::{AssetLoader, OutputSink};
use hush_ap::config::{Config, ConfigOverrides, LoggingConfig};
use hush_ap::playback::CountdownScheduler;
use hush_ap::{AppSession, SessionOptions};
use hush_common::config::ASSET_DIR_ENV;
use hush_common::time::parse_time_of_day;
use hush_common::{Category, HushEvent};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for hush-ap
#[derive(Parser, Debug)]
#[command(name = "hush-ap")]
#[command(about = "Looping ambient sound player with loudness metering and sleep timer")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/hush/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder containing the category sound assets
    #[arg(short, long, env = ASSET_DIR_ENV)]
    asset_dir: Option<PathBuf>,

    /// Category to start with (white_noise, nature, rhythm or 0-2)
    #[arg(long)]
    category: Option<Category>,

    /// Sleep timer target time of day (HH:MM or HH:MM:SS, local time)
    #[arg(long)]
    alarm: Option<String>,

    /// Run the timer for a fixed number of minutes instead of to a time of day
    #[arg(long, conflicts_with = "alarm")]
    minutes: Option<u32>,

    /// Render without an audio device
    #[arg(long)]
    no_audio: bool,

    /// Output device name
    #[arg(long)]
    device: Option<String>,

    /// Loudness sampling frequency in Hz
    #[arg(long)]
    refresh_hz: Option<u32>,

    /// Print events to stdout as JSON lines
    #[arg(long)]
    json_events: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            asset_dir: self.asset_dir.clone(),
            category: self.category,
            no_audio: self.no_audio,
            device: self.device.clone(),
            refresh_hz: self.refresh_hz,
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        let directive = if logging.level.contains('=') {
            logging.level.clone()
        } else {
            format!("hush_ap={0},hush_common={0}", logging.level)
        };
        EnvFilter::try_new(directive)
    })?;

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.overrides())
        .await
        .context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting hush-ap {} ({}, {} build, {})",
        env!("CARGO_PKG_VERSION"),
        env!("HUSH_GIT_HASH"),
        env!("HUSH_BUILD_PROFILE"),
        env!("HUSH_BUILD_TIMESTAMP")
    );
    match &config.source_path {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file, using defaults"),
    }
    info!("Asset folder: {}", config.asset_dir.display());
    info!("Initial category: {}", config.initial_category.title());

    let sink = Arc::new(
        OutputSink::open(config.output.clone()).context("Failed to open audio output")?,
    );
    let loader = Arc::new(AssetLoader::new(config.asset_dir.clone(), sink));
    let session = AppSession::new(loader, SessionOptions::from(&config));
    let mut events = session.subscribe();

    session.start();

    if let Some(alarm) = args.alarm.as_deref() {
        let target = parse_time_of_day(alarm).context("Invalid --alarm time")?;
        info!(
            "Sleep timer preview: {}",
            CountdownScheduler::sleep_estimate(target)
        );
        session.countdown().start(target);
    } else if let Some(minutes) = args.minutes {
        session.countdown().start_minutes(minutes);
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                report_event(&event, args.json_events);
                if matches!(event, HushEvent::CountdownExpired { .. }) {
                    info!("Sleep timer expired, exiting");
                    break;
                }
            }
        }
    }

    session.shutdown();
    info!("Shutdown complete");
    Ok(())
}

fn report_event(event: &HushEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize {}: {}", event.event_type(), e),
        }
        return;
    }

    match event {
        HushEvent::CategoryChanged { new_category, .. } => {
            info!(event = event.event_type(), "Now playing {}", new_category.title())
        }
        HushEvent::CountdownTick { remaining_seconds } if remaining_seconds % 60 != 0 => {}
        _ => info!(event = event.event_type(), "{:?}", event),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
