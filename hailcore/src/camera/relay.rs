//! Camera authority arbitration.

use std::sync::{Arc, Weak};

use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::{Mutex, ReentrantMutex};

use super::provider::{MapCenterListener, MapStateProvider};
use super::types::{CameraCommand, MapPath, MapSettings, MarkerMap};
use crate::reactive::{BehaviorSubject, Observable, PublishSubject, Subscription, Subscriptions};

/// Mediates between user drags and programmatic camera moves.
///
/// While the map is centered, camera commands pass straight through to the
/// renderer. Once the user drags the map, commands are held back (only the
/// most recent one is kept) until [`re_center_map`](Self::re_center_map) is
/// called or a command is submitted with `force`.
///
/// The relay also forwards settings, markers, and paths from the currently
/// bound [`MapStateProvider`]. At most one provider is bound at a time.
///
/// Create one relay per navigation scope and pass clones down to screens;
/// clones share state.
#[derive(Clone)]
pub struct CameraRelay {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    state: Mutex<RelayState>,
    settings: BehaviorSubject<MapSettings>,
    markers: BehaviorSubject<MarkerMap>,
    paths: BehaviorSubject<Vec<MapPath>>,
    commands: PublishSubject<CameraCommand>,
    binding: Mutex<Subscriptions>,
    /// Held from a centered change until its listener call returns, so the
    /// listener sees changes in the order they were made. Reentrant so a
    /// listener may call back into the relay.
    notify: ReentrantMutex<()>,
}

struct RelayState {
    centered: bool,
    latest: Option<CameraCommand>,
    listener: Option<Arc<dyn MapCenterListener>>,
    /// Bumped on every bind/unbind; forwarders from older bindings stop.
    generation: u64,
}

impl std::fmt::Debug for CameraRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CameraRelay")
            .field("centered", &state.centered)
            .field("latest", &state.latest)
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}

impl Default for CameraRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraRelay {
    /// Create an uncentered relay with no provider bound.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                state: Mutex::new(RelayState {
                    centered: false,
                    latest: None,
                    listener: None,
                    generation: 0,
                }),
                settings: BehaviorSubject::new(MapSettings::default()),
                markers: BehaviorSubject::new(MarkerMap::new()),
                paths: BehaviorSubject::new(Vec::new()),
                commands: PublishSubject::new(),
                binding: Mutex::new(Subscriptions::new()),
                notify: ReentrantMutex::new(()),
            }),
        }
    }

    /// Whether the relay currently has camera authority.
    pub fn is_centered(&self) -> bool {
        self.inner.state.lock().centered
    }

    /// The most recently requested command, applied or not.
    pub fn latest_command(&self) -> Option<CameraCommand> {
        self.inner.state.lock().latest.clone()
    }

    /// The user dragged the map: hold back non-forced commands from now on.
    pub fn map_was_dragged(&self) {
        let _notify = self.inner.notify.lock();
        let listener = {
            let mut state = self.inner.state.lock();
            if !state.centered {
                return;
            }
            state.centered = false;
            state.listener.clone()
        };
        tracing::debug!("Map dragged, camera under manual control");
        if let Some(listener) = listener {
            listener.on_centered_changed(false);
        }
    }

    /// Take camera authority back and re-apply the latest requested command.
    pub fn re_center_map(&self) {
        let _notify = self.inner.notify.lock();
        let (changed, listener) = {
            let mut state = self.inner.state.lock();
            let changed = !state.centered;
            state.centered = true;
            if let Some(command) = state.latest.clone() {
                self.inner.commands.emit(command);
            }
            (changed, state.listener.clone())
        };
        if changed {
            tracing::debug!("Map re-centered");
            if let Some(listener) = listener {
                listener.on_centered_changed(true);
            }
        }
    }

    /// Request a camera move.
    ///
    /// Applied immediately when centered or when `force` is set; otherwise
    /// remembered as the latest command (replacing any earlier one) until the
    /// next re-center.
    pub fn move_camera(&self, command: CameraCommand, force: bool) {
        let mut state = self.inner.state.lock();
        self.inner.move_camera_locked(&mut state, command, force);
    }

    /// Bind a provider, replacing the previously bound one.
    ///
    /// The previous provider's forwarding is torn down before the new one
    /// starts. `listener` receives the current centered value right away and
    /// every change afterwards.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn connect_to_provider(
        &self,
        provider: &dyn MapStateProvider,
        listener: Arc<dyn MapCenterListener>,
    ) {
        let _notify = self.inner.notify.lock();
        let mut binding = self.inner.binding.lock();
        binding.clear();

        let (generation, centered) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.listener = Some(Arc::clone(&listener));
            (state.generation, state.centered)
        };

        binding.add(self.forward(generation, provider.settings(), |inner, _, settings| {
            inner.settings.set(settings)
        }));
        binding.add(self.forward(generation, provider.markers(), |inner, _, markers| {
            inner.markers.set(markers)
        }));
        binding.add(self.forward(generation, provider.paths(), |inner, _, paths| {
            inner.paths.set(paths)
        }));
        binding.add(self.forward(generation, provider.camera_updates(), |inner, state, request| {
            inner.move_camera_locked(state, request.command, request.force)
        }));
        drop(binding);

        tracing::debug!(generation, "Map state provider connected");
        listener.on_centered_changed(centered);
    }

    /// Unbind the current provider and listener, if any.
    pub fn disconnect(&self) {
        let binding = self.inner.binding.lock();
        binding.clear();
        let mut state = self.inner.state.lock();
        state.generation += 1;
        state.listener = None;
        tracing::debug!(generation = state.generation, "Map state provider disconnected");
    }

    /// Renderer settings from the bound provider (replays latest).
    pub fn settings(&self) -> Observable<MapSettings> {
        self.inner.settings.subscribe()
    }

    /// Camera commands the renderer should apply, from now on.
    pub fn camera_commands(&self) -> Observable<CameraCommand> {
        self.inner.commands.subscribe()
    }

    /// Marker sets from the bound provider (replays latest).
    pub fn markers(&self) -> Observable<MarkerMap> {
        self.inner.markers.subscribe()
    }

    /// Path lists from the bound provider (replays latest).
    pub fn paths(&self) -> Observable<Vec<MapPath>> {
        self.inner.paths.subscribe()
    }

    /// Spawn a task feeding `source` into the relay while `generation` is
    /// still the bound one.
    fn forward<T, F>(&self, generation: u64, mut source: BoxStream<'static, T>, apply: F) -> Subscription
    where
        T: Send + 'static,
        F: Fn(&RelayInner, &mut RelayState, T) + Send + 'static,
    {
        let weak: Weak<RelayInner> = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            while let Some(item) = source.next().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let mut state = inner.state.lock();
                if state.generation != generation {
                    break;
                }
                apply(&inner, &mut *state, item);
            }
        });
        Subscription::from_task(&task)
    }
}

impl RelayInner {
    fn move_camera_locked(&self, state: &mut RelayState, command: CameraCommand, force: bool) {
        state.latest = Some(command.clone());
        if state.centered || force {
            tracing::trace!(force, ?command, "Camera command applied");
            self.commands.emit(command);
        } else {
            tracing::trace!(?command, "Camera command held until re-center");
        }
    }
}
