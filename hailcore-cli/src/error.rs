//! CLI error handling with user-friendly messages.

use std::fmt;
use std::path::PathBuf;
use std::process;

use hailcore::config::ConfigFileError;
use hailcore::fleet::FleetDirectoryError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration file could not be loaded
    Config(ConfigFileError),
    /// No fleet file given on the command line or in config.ini
    MissingFleetsFile,
    /// Fleet file could not be loaded
    Directory(FleetDirectoryError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Resolution ended without producing a fleet
    NothingResolved { fleets_file: PathBuf },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::MissingFleetsFile = self {
            eprintln!();
            eprintln!("Pass --fleets <file.json> or set it in config.ini:");
            eprintln!("  [directory]");
            eprintln!("  fleets_file = ~/.hailcore/fleets.json");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::MissingFleetsFile => write!(f, "No fleet file configured"),
            CliError::Directory(e) => write!(f, "Failed to load fleets: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::NothingResolved { fleets_file } => write!(
                f,
                "No fleet could be resolved from '{}'",
                fleets_file.display()
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Directory(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<FleetDirectoryError> for CliError {
    fn from(e: FleetDirectoryError) -> Self {
        CliError::Directory(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_includes_cause() {
        let err = CliError::Directory(FleetDirectoryError::Parse("bad json".to_string()));
        assert_eq!(
            err.to_string(),
            "Failed to load fleets: Invalid fleet data: bad json"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_missing_fleets_file_has_no_source() {
        assert!(CliError::MissingFleetsFile.source().is_none());
    }
}
