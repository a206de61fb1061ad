//! Application entry point for the RRT planner viewer.
//!
//! This binary sets up logging and eframe/egui and delegates all interactive
//! logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use std::path::Path;

use rrt_core::{config::Config, error::ConfigError};
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

const DEFAULT_CONFIG: &str = "rrt.toml";

/// Loads the config named on the command line, else `rrt.toml` if present,
/// else the defaults.
fn load_config() -> Result<Config, ConfigError> {
    if let Some(path) = std::env::args().nth(1) {
        info!("Loading configuration from {path}");
        return Config::load(path);
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        info!("Loading configuration from {DEFAULT_CONFIG}");
        return Config::load(DEFAULT_CONFIG);
    }
    info!("Using default configuration");
    Ok(Config::default())
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the configuration is invalid or eframe fails to create the
///   native window or event loop.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = load_config()?;
    let viewer = Viewer::new(cfg)?;

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "RRT Planner",
        options,
        Box::new(|_cc| Ok(Box::new(viewer))),
    )
    .map_err(|e| anyhow::anyhow!("eframe failed: {e}"))
}
