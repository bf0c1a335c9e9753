//! Concrete fleet directories and location providers.
//!
//! These back the CLI and the test suites. An app embedding the library
//! supplies its own implementations of [`FleetDirectory`] and
//! [`LocationProvider`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt};

use crate::fleet::{
    FleetDirectory, FleetDirectoryError, FleetInfo, LocationAndHeading, LocationError,
    LocationProvider,
};
use crate::geo::LatLng;
use crate::reactive::BehaviorSubject;

/// Directory that serves one fixed fleet list per subscription.
#[derive(Debug, Default)]
pub struct StaticFleetDirectory {
    fleets: Vec<FleetInfo>,
    destroyed: AtomicU32,
}

impl StaticFleetDirectory {
    pub fn new(fleets: Vec<FleetInfo>) -> Self {
        Self {
            fleets,
            destroyed: AtomicU32::new(0),
        }
    }

    /// Number of times [`FleetDirectory::destroy`] was called.
    pub fn destroy_count(&self) -> u32 {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl FleetDirectory for StaticFleetDirectory {
    fn fleets(&self) -> BoxStream<'static, Result<Vec<FleetInfo>, FleetDirectoryError>> {
        stream::once(future::ready(Ok(self.fleets.clone()))).boxed()
    }

    fn destroy(&self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Directory whose fleet list can change while subscribed.
///
/// Subscribers get the current list immediately and every list published
/// afterwards. Subscriptions never end on their own.
#[derive(Debug)]
pub struct SharedFleetDirectory {
    fleets: BehaviorSubject<Vec<FleetInfo>>,
    destroyed: AtomicBool,
}

impl SharedFleetDirectory {
    pub fn new(fleets: Vec<FleetInfo>) -> Self {
        Self {
            fleets: BehaviorSubject::new(fleets),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Replace the fleet list and notify all subscribers.
    pub fn publish(&self, fleets: Vec<FleetInfo>) {
        tracing::debug!(count = fleets.len(), "Publishing fleet list");
        self.fleets.set(fleets);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.fleets.subscriber_count()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl FleetDirectory for SharedFleetDirectory {
    fn fleets(&self) -> BoxStream<'static, Result<Vec<FleetInfo>, FleetDirectoryError>> {
        if self.is_destroyed() {
            return stream::once(future::ready(Err(FleetDirectoryError::ShutDown))).boxed();
        }
        self.fleets.subscribe().map(Ok).boxed()
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

/// Directory backed by a JSON file holding an array of fleets.
///
/// The file is re-read on every subscription, so a retry picks up a file
/// that was fixed in the meantime.
///
/// ```json
/// [
///   { "id": "berlin", "name": "Berlin", "center": { "latitude": 52.52, "longitude": 13.405 } },
///   { "id": "test", "name": "Test", "is_phantom": true }
/// ]
/// ```
#[derive(Debug)]
pub struct JsonFleetDirectory {
    path: PathBuf,
    destroyed: AtomicBool,
}

impl JsonFleetDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the fleet file once.
    pub async fn load(&self) -> Result<Vec<FleetInfo>, FleetDirectoryError> {
        load_fleets(self.path.clone()).await
    }
}

async fn load_fleets(path: PathBuf) -> Result<Vec<FleetInfo>, FleetDirectoryError> {
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| FleetDirectoryError::Read {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    let fleets: Vec<FleetInfo> = serde_json::from_str(&content)
        .map_err(|e| FleetDirectoryError::Parse(format!("{}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), count = fleets.len(), "Loaded fleet file");
    Ok(fleets)
}

impl FleetDirectory for JsonFleetDirectory {
    fn fleets(&self) -> BoxStream<'static, Result<Vec<FleetInfo>, FleetDirectoryError>> {
        if self.destroyed.load(Ordering::SeqCst) {
            return stream::once(future::ready(Err(FleetDirectoryError::ShutDown))).boxed();
        }
        stream::once(load_fleets(self.path.clone())).boxed()
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

/// Location provider that always reports the same fix.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    fix: LocationAndHeading,
}

impl FixedLocation {
    pub fn new(location: LatLng) -> Self {
        Self {
            fix: LocationAndHeading::new(location),
        }
    }

    pub fn with_heading(mut self, heading: f32) -> Self {
        self.fix.heading = Some(heading);
        self
    }
}

impl LocationProvider for FixedLocation {
    fn last_known_location(&self) -> BoxFuture<'static, Result<LocationAndHeading, LocationError>> {
        future::ready(Ok(self.fix)).boxed()
    }
}
