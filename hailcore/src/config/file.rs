//! Configuration file handling.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::fleet::{FleetInfo, FleetResolverConfig, FleetSelection, DEFAULT_FLEET_ID, DEFAULT_FLEET_NAME};
use crate::retry::{RetryPolicy, RETRY_COUNT};

/// Default log directory, relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "hailcore.log";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[fleet]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSettings {
    /// Resubscriptions allowed after the first failed attempt.
    pub retry_count: u32,
    /// Id of the fallback fleet.
    pub default_id: String,
    /// Display name of the fallback fleet.
    pub default_name: String,
    /// Initial fleet selection.
    pub selection: FleetSelection,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            retry_count: RETRY_COUNT,
            default_id: DEFAULT_FLEET_ID.to_string(),
            default_name: DEFAULT_FLEET_NAME.to_string(),
            selection: FleetSelection::Automatic,
        }
    }
}

/// `[directory]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectorySettings {
    /// JSON file listing the available fleets.
    pub fleets_file: Option<PathBuf>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// Parsed contents of `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreConfig {
    pub fleet: FleetSettings,
    pub directory: DirectorySettings,
    pub logging: LoggingSettings,
}

impl CoreConfig {
    /// Load configuration from the default path (~/.hailcore/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Resolver configuration derived from the `[fleet]` section.
    pub fn fleet_resolver_config(&self) -> FleetResolverConfig {
        FleetResolverConfig {
            retry_policy: RetryPolicy::retry_at_most(self.fleet.retry_count),
            default_fleet: FleetInfo::new(
                self.fleet.default_id.clone(),
                self.fleet.default_name.clone(),
                None,
            ),
        }
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("fleet"))
            .set("retry_count", self.fleet.retry_count.to_string())
            .set("default_id", self.fleet.default_id.as_str())
            .set("default_name", self.fleet.default_name.as_str())
            .set("selection", self.fleet.selection.to_string());
        if let Some(fleets_file) = &self.directory.fleets_file {
            ini.with_section(Some("directory"))
                .set("fleets_file", fleets_file.display().to_string());
        }
        ini.with_section(Some("logging"))
            .set("directory", self.logging.directory.display().to_string())
            .set("file", self.logging.file.as_str());
        ini
    }
}

/// Get the path to the config directory (~/.hailcore).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hailcore")
}

/// Get the path to the config file (~/.hailcore/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoreConfig::default();

        assert_eq!(config.fleet.retry_count, RETRY_COUNT);
        assert_eq!(config.fleet.default_id, DEFAULT_FLEET_ID);
        assert!(config.fleet.selection.is_automatic());
        assert!(config.directory.fleets_file.is_none());
        assert_eq!(config.logging.file, DEFAULT_LOG_FILE);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = CoreConfig::load_from(&config_path).unwrap();

        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");
        let mut config = CoreConfig::default();
        config.fleet.retry_count = 5;
        config.fleet.selection = FleetSelection::manual("berlin");
        config.directory.fleets_file = Some(temp_dir.path().join("fleets.json"));

        config.save_to(&config_path).unwrap();
        let reloaded = CoreConfig::load_from(&config_path).unwrap();

        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_fleet_resolver_config() {
        let mut config = CoreConfig::default();
        config.fleet.retry_count = 1;
        config.fleet.default_id = "home".to_string();

        let resolver_config = config.fleet_resolver_config();

        assert_eq!(resolver_config.retry_policy.max_attempts(), 2);
        assert_eq!(resolver_config.default_fleet.id, "home");
        assert!(resolver_config.default_fleet.center.is_none());
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with(".hailcore/config.ini"));
    }
}
