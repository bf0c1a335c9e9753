//! INI parsing: the single place where INI key names map to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::{ConfigFileError, CoreConfig};
use crate::fleet::FleetSelection;

/// Parse an `Ini` object into a `CoreConfig`.
///
/// Starts from `CoreConfig::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<CoreConfig, ConfigFileError> {
    let mut config = CoreConfig::default();

    // [fleet] section
    if let Some(section) = ini.section(Some("fleet")) {
        if let Some(v) = section.get("retry_count") {
            config.fleet.retry_count =
                v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "fleet".to_string(),
                    key: "retry_count".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer".to_string(),
                })?;
        }
        if let Some(v) = section.get("default_id") {
            let v = v.trim();
            if v.is_empty() {
                return Err(ConfigFileError::InvalidValue {
                    section: "fleet".to_string(),
                    key: "default_id".to_string(),
                    value: v.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            config.fleet.default_id = v.to_string();
        }
        if let Some(v) = section.get("default_name") {
            config.fleet.default_name = v.trim().to_string();
        }
        if let Some(v) = section.get("selection") {
            config.fleet.selection = v.trim().parse::<FleetSelection>().unwrap_or_default();
        }
    }

    // [directory] section
    if let Some(section) = ini.section(Some("directory")) {
        if let Some(v) = section.get("fleets_file") {
            let v = v.trim();
            if !v.is_empty() {
                config.directory.fleets_file = Some(expand_tilde(v));
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if v.is_empty() || v.contains('/') {
                return Err(ConfigFileError::InvalidValue {
                    section: "logging".to_string(),
                    key: "file".to_string(),
                    value: v.to_string(),
                    reason: "must be a plain file name".to_string(),
                });
            }
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

/// Expand a leading `~/` to the user's home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
