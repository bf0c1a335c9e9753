//! HailCore CLI - Command-line interface
//!
//! Drives the HailCore fleet resolver and camera relay from the terminal.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hailcore::config::{config_file_path, CoreConfig};
use hailcore::logging;

use crate::commands::{camera_demo, fleets, resolve};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "hailcore")]
#[command(version, about = "Fleet resolution and map camera tools", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.hailcore/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the log file (overrides config.ini)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the operating fleet for a location
    Resolve(resolve::ResolveArgs),

    /// List fleets ranked by distance from a location
    Fleets(fleets::FleetsArgs),

    /// Run a scripted camera relay session
    CameraDemo,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config_file_path);
    let config = CoreConfig::load_from(&config_path)?;

    let log_dir = cli
        .log_dir
        .unwrap_or_else(|| config.logging.directory.clone());
    let _logging_guard =
        logging::init_logging(&log_dir, &config.logging.file).map_err(CliError::LoggingInit)?;
    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async {
        match cli.command {
            Commands::Resolve(args) => resolve::run(args, &config).await,
            Commands::Fleets(args) => fleets::run(args, &config).await,
            Commands::CameraDemo => camera_demo::run().await,
        }
    })
}
