//! User configuration loaded from `~/.hailcore/config.ini`.
//!
//! # Example
//!
//! ```ignore
//! use hailcore::config::CoreConfig;
//!
//! let config = CoreConfig::load()?;
//! let resolver = FleetResolver::with_config(
//!     directory,
//!     location,
//!     Arc::new(HaversineDistance),
//!     config.fleet_resolver_config(),
//! );
//! ```

mod file;
mod parser;

pub use file::{
    config_directory, config_file_path, ConfigFileError, CoreConfig, DirectorySettings,
    FleetSettings, LoggingSettings, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE,
};
