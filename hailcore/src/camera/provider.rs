//! Map state sources and centering listeners.
//!
//! A screen that draws on the map implements [`MapStateProvider`] (or uses
//! [`ScreenMapState`]) and binds it to the relay with
//! [`CameraRelay::connect_to_provider`](super::CameraRelay::connect_to_provider).

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;

use super::types::{CameraCommand, CameraRequest, MapPath, MapSettings, MarkerMap};
use crate::reactive::{BehaviorSubject, PublishSubject};

/// Source of everything a screen wants drawn on the map.
///
/// Streams are requested once per binding. Each method defaults to an empty
/// stream so a screen only implements what it draws.
pub trait MapStateProvider: Send + Sync {
    /// Renderer settings.
    fn settings(&self) -> BoxStream<'static, MapSettings> {
        stream::empty().boxed()
    }

    /// Camera movement requests.
    fn camera_updates(&self) -> BoxStream<'static, CameraRequest> {
        stream::empty().boxed()
    }

    /// Complete marker sets.
    fn markers(&self) -> BoxStream<'static, MarkerMap> {
        stream::empty().boxed()
    }

    /// Complete path lists.
    fn paths(&self) -> BoxStream<'static, Vec<MapPath>> {
        stream::empty().boxed()
    }
}

/// Receives centering changes, e.g. to show or hide a re-center button.
pub trait MapCenterListener: Send + Sync {
    /// Called with the new centered value whenever it changes, and once with
    /// the current value when the listener is bound.
    fn on_centered_changed(&self, centered: bool);
}

/// Listener for screens that don't care about centering.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreCentering;

impl MapCenterListener for IgnoreCentering {
    fn on_centered_changed(&self, _centered: bool) {}
}

/// Listener that records every notification. Handy in tests and demos.
#[derive(Debug, Default)]
pub struct RecordingCenterListener {
    events: Mutex<Vec<bool>>,
}

impl RecordingCenterListener {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every value received, oldest first.
    pub fn events(&self) -> Vec<bool> {
        self.events.lock().clone()
    }
}

impl MapCenterListener for RecordingCenterListener {
    fn on_centered_changed(&self, centered: bool) {
        self.events.lock().push(centered);
    }
}

/// Subject-backed [`MapStateProvider`] a screen can push into.
///
/// Settings, markers, and paths replay their latest value to a newly bound
/// relay. Camera requests are events: only requests made while bound are
/// delivered.
#[derive(Debug)]
pub struct ScreenMapState {
    settings: BehaviorSubject<MapSettings>,
    camera: PublishSubject<CameraRequest>,
    markers: BehaviorSubject<MarkerMap>,
    paths: BehaviorSubject<Vec<MapPath>>,
}

impl Default for ScreenMapState {
    fn default() -> Self {
        Self::new(MapSettings::default())
    }
}

impl ScreenMapState {
    /// Create a provider with initial settings and no markers or paths.
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings: BehaviorSubject::new(settings),
            camera: PublishSubject::new(),
            markers: BehaviorSubject::new(MarkerMap::new()),
            paths: BehaviorSubject::new(Vec::new()),
        }
    }

    /// Replace the renderer settings.
    pub fn set_settings(&self, settings: MapSettings) {
        self.settings.set(settings);
    }

    /// Replace the whole marker set.
    pub fn set_markers(&self, markers: MarkerMap) {
        self.markers.set(markers);
    }

    /// Replace the whole path list.
    pub fn set_paths(&self, paths: Vec<MapPath>) {
        self.paths.set(paths);
    }

    /// Ask for a camera move that respects manual control.
    pub fn request_camera(&self, command: CameraCommand) {
        self.camera.emit(CameraRequest::new(command));
    }

    /// Ask for a camera move that overrides manual control.
    pub fn force_camera(&self, command: CameraCommand) {
        self.camera.emit(CameraRequest::forced(command));
    }
}

impl MapStateProvider for ScreenMapState {
    fn settings(&self) -> BoxStream<'static, MapSettings> {
        self.settings.subscribe()
    }

    fn camera_updates(&self) -> BoxStream<'static, CameraRequest> {
        self.camera.subscribe()
    }

    fn markers(&self) -> BoxStream<'static, MarkerMap> {
        self.markers.subscribe()
    }

    fn paths(&self) -> BoxStream<'static, Vec<MapPath>> {
        self.paths.subscribe()
    }
}
