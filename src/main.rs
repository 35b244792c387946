//! Measurement Viewer - Main Entry Point
//!
//! Opens the viewer window, optionally loading files or a remote file list
//! given on the command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use iumview::{
    app::LaunchOptions,
    config::{self, ViewerConfig},
    frontend::ViewerApp,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "iumview")]
#[command(about = "Drag-and-drop viewer for spectroscopy and measurement files")]
#[command(version)]
struct Cli {
    /// Files or directories to load on startup
    files: Vec<PathBuf>,

    /// URL of a remote file list to load on startup
    #[arg(long, env = "IUMVIEW_FILELIST")]
    filelist: Option<String>,

    /// Configuration file to use instead of the default location
    #[arg(long, env = "IUMVIEW_CONFIG")]
    config: Option<PathBuf>,
}

/// Log to stderr and to a daily rolling file in the app data directory.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging() -> Option<WorkerGuard> {
    let (file_layer, guard) = match config::ensure_app_data_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join(config::LOG_DIR), "iumview.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,iumview=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging();

    tracing::info!("Starting Measurement Viewer");

    let config = match &cli.config {
        Some(path) if path.exists() => ViewerConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        Some(path) => {
            tracing::info!("Config {:?} does not exist yet, using defaults", path);
            ViewerConfig::default()
        }
        None => ViewerConfig::load_or_default(),
    };

    let launch = LaunchOptions {
        files: cli.files,
        filelist: cli.filelist,
        config_path: cli.config,
    };
    if launch.has_initial_load() {
        tracing::debug!(?launch, "Initial load requested");
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true)
            .with_title("Measurement Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "Measurement Viewer",
        native_options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, config, launch)?))),
    )
    .map_err(|e| anyhow::anyhow!("Viewer exited with an error: {}", e))?;

    tracing::info!("Shutting down...");
    Ok(())
}
