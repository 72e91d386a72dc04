//! Orrery entry point.
//!
//! Loads `config.ron` (creating it on first run), applies CLI overrides,
//! builds the orbit model from the built-in solar system or a RON table, then
//! either opens the window or runs a fixed number of headless frames and
//! prints the final body positions as JSON.
//!
//! Run with: `cargo run -p orrery -- --headless-frames 100`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use orrery_app::{AppError, run_headless};
use orrery_config::{CliArgs, Config, ConfigError, default_config_dir};
use orrery_orbit::{BodySnapshot, OrbitError, OrbitModel, SystemDef, default_solar_system};
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum OrreryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid system table: {0}")]
    Orbit(#[from] OrbitError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("failed to encode positions: {0}")]
    Json(#[from] serde_json::Error),
}

/// Printed to stdout after a headless run.
#[derive(Debug, Serialize)]
struct HeadlessReport {
    frames: u64,
    bodies: Vec<BodySnapshot>,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let (config, config_dir) = match resolve_config(&args) {
        Ok(resolved) => resolved,
        Err(e) => {
            orrery_log::init_logging(None, false, None);
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    orrery_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );
    info!(
        "Orrery {} | config: {}",
        env!("CARGO_PKG_VERSION"),
        config_dir.display()
    );

    match run(&args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Config from `--config` (or the platform directory), with CLI overrides applied.
fn resolve_config(args: &CliArgs) -> Result<(Config, PathBuf), ConfigError> {
    let config_dir = match &args.config {
        Some(dir) => dir.clone(),
        None => default_config_dir()?,
    };
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);
    Ok((config, config_dir))
}

/// Orbit model from the configured system file, or the built-in solar system.
fn load_model(config: &Config) -> Result<OrbitModel, OrbitError> {
    let system = match &config.scene.system_file {
        Some(path) => SystemDef::load(path)?,
        None => default_solar_system(),
    };
    OrbitModel::from_system(&system)
}

fn headless_report(model: OrbitModel, frames: u64, position_log_interval: u64) -> HeadlessReport {
    let run = run_headless(model, frames, position_log_interval);
    HeadlessReport {
        frames: run.frames,
        bodies: run.snapshot(),
    }
}

fn run(args: &CliArgs, config: Config) -> Result<(), OrreryError> {
    let model = load_model(&config)?;
    info!(
        star = %model.root().name,
        bodies = model.len(),
        "solar system ready"
    );

    if let Some(frames) = args.headless_frames {
        let report = headless_report(model, frames, config.debug.position_log_interval);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let base = std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
    let textures_dir = config.textures_dir(&base);
    info!(
        "Window: {}x{} | Textures: {}",
        config.window.width,
        config.window.height,
        textures_dir.display()
    );
    orrery_app::run(config, model, textures_dir)?;
    Ok(())
}
