//! Integration tests for fleet resolution.
//!
//! These tests drive the resolver the way an app does:
//! - fleet list from a JSON file on disk
//! - selection changes arriving over time
//! - resolver settings from config.ini
//!
//! Run with: `cargo test --test fleet_resolution_integration`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use hailcore::config::CoreConfig;
use hailcore::directory::{FixedLocation, JsonFleetDirectory};
use hailcore::fleet::{FleetInfo, FleetResolver, FleetSelection, ResolvedFleetStream};
use hailcore::geo::{HaversineDistance, LatLng};

// ============================================================================
// Helper Functions
// ============================================================================

/// Alexanderplatz, Berlin.
const DEVICE: LatLng = LatLng::new(52.5219, 13.4132);

const FLEETS_JSON: &str = r#"[
    { "id": "hamburg", "name": "Hamburg", "center": { "latitude": 53.5511, "longitude": 9.9937 } },
    { "id": "berlin", "name": "Berlin", "center": { "latitude": 52.52, "longitude": 13.405 } },
    { "id": "demo", "name": "Demo", "center": { "latitude": 52.5219, "longitude": 13.4132 }, "is_phantom": true },
    { "id": "airport", "name": "Airport Shuttle" }
]"#;

fn write_fleets(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("fleets.json");
    std::fs::write(&path, content).unwrap();
    path
}

fn resolver_for(path: &Path, config: &CoreConfig) -> FleetResolver {
    FleetResolver::with_config(
        Arc::new(JsonFleetDirectory::new(path)),
        Arc::new(FixedLocation::new(DEVICE)),
        Arc::new(HaversineDistance),
        config.fleet_resolver_config(),
    )
}

async fn next_fleet(stream: &mut ResolvedFleetStream) -> FleetInfo {
    tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("timed out waiting for a resolved fleet")
        .expect("resolved fleet stream ended early")
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Automatic selection picks the nearest real fleet, not the phantom one
/// sitting exactly on the device.
#[tokio::test]
async fn test_automatic_selection_from_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fleets(temp_dir.path(), FLEETS_JSON);
    let resolver = resolver_for(&path, &CoreConfig::default());

    let resolved: Vec<_> = resolver
        .resolve_fleet(futures::stream::iter([FleetSelection::Automatic]))
        .collect()
        .await;

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, "berlin");
}

/// Selections arriving over time each resolve in turn.
#[tokio::test]
async fn test_changing_selection_stream() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fleets(temp_dir.path(), FLEETS_JSON);
    let resolver = resolver_for(&path, &CoreConfig::default());
    let (tx, rx) = mpsc::unbounded_channel();
    let mut resolved = resolver.resolve_fleet(UnboundedReceiverStream::new(rx));

    tx.send(FleetSelection::manual("hamburg")).unwrap();
    assert_eq!(next_fleet(&mut resolved).await.id, "hamburg");

    // A fleet without a center is still selectable by id
    tx.send(FleetSelection::manual("airport")).unwrap();
    assert_eq!(next_fleet(&mut resolved).await.id, "airport");

    // An id that vanished from the directory falls back to automatic
    tx.send(FleetSelection::manual("munich")).unwrap();
    assert_eq!(next_fleet(&mut resolved).await.id, "berlin");

    tx.send(FleetSelection::Automatic).unwrap();
    assert_eq!(next_fleet(&mut resolved).await.id, "berlin");

    drop(tx);
    let rest = tokio::time::timeout(Duration::from_secs(2), resolved.collect::<Vec<_>>())
        .await
        .unwrap();
    assert!(rest.is_empty());
}

/// A missing fleet file exhausts the retry budget and resolves to the
/// default fleet from config.ini.
#[tokio::test]
async fn test_missing_file_resolves_to_configured_default() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.ini");
    std::fs::write(
        &config_path,
        "[fleet]\nretry_count = 1\ndefault_id = fallback\ndefault_name = Fallback\n",
    )
    .unwrap();
    let config = CoreConfig::load_from(&config_path).unwrap();
    let resolver = resolver_for(&temp_dir.path().join("missing.json"), &config);

    let mut resolved = resolver.resolve_fleet(futures::stream::iter([FleetSelection::Automatic]));

    let fleet = next_fleet(&mut resolved).await;
    assert_eq!(fleet.id, "fallback");
    assert_eq!(fleet.name, "Fallback");
    assert!(resolved.next().await.is_none());
}

/// A malformed file is treated like an unreachable directory.
#[tokio::test]
async fn test_malformed_file_resolves_to_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fleets(temp_dir.path(), "{ \"id\": ");
    let resolver = resolver_for(&path, &CoreConfig::default());

    let mut resolved =
        resolver.resolve_fleet(futures::stream::iter([FleetSelection::manual("berlin")]));

    assert!(next_fleet(&mut resolved).await.is_default());
}

/// Every subscription re-reads the file, so a later selection sees edits.
#[tokio::test]
async fn test_file_edits_visible_to_next_selection() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fleets(temp_dir.path(), FLEETS_JSON);
    let resolver = resolver_for(&path, &CoreConfig::default());
    let (tx, rx) = mpsc::unbounded_channel();
    let mut resolved = resolver.resolve_fleet(UnboundedReceiverStream::new(rx));

    tx.send(FleetSelection::Automatic).unwrap();
    assert_eq!(next_fleet(&mut resolved).await.id, "berlin");

    write_fleets(
        temp_dir.path(),
        r#"[{ "id": "hamburg", "name": "Hamburg", "center": { "latitude": 53.5511, "longitude": 9.9937 } }]"#,
    );
    tx.send(FleetSelection::Automatic).unwrap();

    assert_eq!(next_fleet(&mut resolved).await.id, "hamburg");
}

/// Shutting down releases the directory; later subscriptions fail over to
/// the default fleet.
#[tokio::test]
async fn test_shut_down_resolver() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fleets(temp_dir.path(), FLEETS_JSON);
    let mut config = CoreConfig::default();
    config.fleet.retry_count = 0;
    let resolver = resolver_for(&path, &config);

    resolver.shut_down();
    resolver.shut_down();
    assert!(resolver.is_shut_down());

    let mut resolved = resolver.resolve_fleet(futures::stream::iter([FleetSelection::Automatic]));
    assert!(next_fleet(&mut resolved).await.is_default());
}
