//! Interfaces the resolver consumes from the rest of the app.

use std::path::PathBuf;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use thiserror::Error;

use super::types::{FleetInfo, LocationAndHeading};

/// Errors reported by a fleet directory.
#[derive(Debug, Clone, Error)]
pub enum FleetDirectoryError {
    /// The directory service could not be reached.
    #[error("Fleet directory unavailable: {0}")]
    Unavailable(String),

    /// A fleet file could not be read.
    #[error("Failed to read fleet file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The fleet data was malformed.
    #[error("Invalid fleet data: {0}")]
    Parse(String),

    /// The directory was destroyed.
    #[error("Fleet directory has been shut down")]
    ShutDown,
}

/// Errors reported by a location provider.
#[derive(Debug, Clone, Error)]
pub enum LocationError {
    /// The device has no last known location.
    #[error("No last known location")]
    Unknown,

    /// The user has not granted location access.
    #[error("Location permission denied")]
    PermissionDenied,

    /// Provider-specific failure.
    #[error("Location provider error: {0}")]
    Provider(String),
}

/// Source of the available fleets.
pub trait FleetDirectory: Send + Sync {
    /// Subscribe to the fleet list.
    ///
    /// Each call starts a new subscription, which is how the resolver
    /// retries. The stream may emit an updated list at any time and may end
    /// with an error.
    fn fleets(&self) -> BoxStream<'static, Result<Vec<FleetInfo>, FleetDirectoryError>>;

    /// Release the directory's resources.
    fn destroy(&self);
}

/// Source of the device location.
pub trait LocationProvider: Send + Sync {
    /// Fetch the last known location once.
    fn last_known_location(&self) -> BoxFuture<'static, Result<LocationAndHeading, LocationError>>;
}
