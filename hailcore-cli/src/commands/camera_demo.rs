//! `hailcore camera-demo`: scripted camera relay session.
//!
//! Walks a relay through the interactions a ride screen produces and prints
//! which camera commands reach the renderer.

use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use hailcore::camera::{CameraCommand, CameraRelay, MapCenterListener, MapSettings, ScreenMapState};
use hailcore::geo::LatLng;
use hailcore::reactive::Observable;

use crate::error::CliError;

const PICKUP: LatLng = LatLng::new(52.5200, 13.4050);
const VEHICLE: LatLng = LatLng::new(52.5163, 13.3777);
const DESTINATION: LatLng = LatLng::new(52.5075, 13.3903);

struct PrintingListener;

impl MapCenterListener for PrintingListener {
    fn on_centered_changed(&self, centered: bool) {
        println!("    re-center button {}", if centered { "hidden" } else { "shown" });
    }
}

pub async fn run() -> Result<(), CliError> {
    let relay = CameraRelay::new();
    let mut commands = relay.camera_commands();

    println!("Pickup screen binds to the relay");
    let pickup_screen = ScreenMapState::new(MapSettings::default());
    relay.connect_to_provider(&pickup_screen, Arc::new(PrintingListener));
    settle(&mut commands).await;

    println!("Screen centers on the pickup point");
    pickup_screen.request_camera(CameraCommand::center_and_zoom(PICKUP, 16.0));
    settle(&mut commands).await;

    println!("User taps re-center");
    relay.re_center_map();
    settle(&mut commands).await;

    println!("Screen follows the approaching vehicle");
    pickup_screen.request_camera(CameraCommand::center_and_zoom(VEHICLE, 16.0));
    settle(&mut commands).await;

    println!("User drags the map");
    relay.map_was_dragged();
    settle(&mut commands).await;

    println!("Screen follows the vehicle again");
    pickup_screen.request_camera(CameraCommand::center_and_zoom(VEHICLE, 17.0));
    settle(&mut commands).await;

    println!("Screen forces the route into view");
    pickup_screen.force_camera(CameraCommand::fit_points([PICKUP, DESTINATION], 64));
    settle(&mut commands).await;

    println!("User taps re-center");
    relay.re_center_map();
    settle(&mut commands).await;

    println!("Trip screen replaces the pickup screen");
    let trip_screen = ScreenMapState::new(MapSettings::default());
    relay.connect_to_provider(&trip_screen, Arc::new(PrintingListener));
    pickup_screen.request_camera(CameraCommand::center_and_zoom(PICKUP, 12.0));
    trip_screen.request_camera(CameraCommand::center_and_zoom(DESTINATION, 15.0));
    settle(&mut commands).await;

    relay.disconnect();
    Ok(())
}

/// Let forwarding tasks run, then print every command the renderer got.
async fn settle(commands: &mut Observable<CameraCommand>) {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }

    let mut delivered = 0;
    while let Some(Some(command)) = commands.next().now_or_never() {
        println!("    renderer <- {:?}", command);
        delivered += 1;
    }
    if delivered == 0 {
        println!("    renderer <- (nothing)");
    }
}
