//! Arguments and helpers shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use hailcore::config::CoreConfig;
use hailcore::geo::LatLng;

use crate::error::CliError;

/// Fleet file and device location.
#[derive(Debug, Args)]
pub struct FleetSource {
    /// JSON file listing the fleets (default: [directory] fleets_file)
    #[arg(long)]
    pub fleets: Option<PathBuf>,

    /// Device latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Device longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

impl FleetSource {
    /// The device location.
    pub fn location(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }

    /// Resolve the fleet file from CLI args and config.
    ///
    /// The command line takes precedence over config.ini.
    pub fn fleets_file(&self, config: &CoreConfig) -> Result<PathBuf, CliError> {
        self.fleets
            .clone()
            .or_else(|| config.directory.fleets_file.clone())
            .ok_or(CliError::MissingFleetsFile)
    }
}

/// Format a distance for display.
pub fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1_000.0)
    }
}
