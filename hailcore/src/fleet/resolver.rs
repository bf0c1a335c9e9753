//! Reactive fleet resolution.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

use super::collaborators::{FleetDirectory, LocationProvider};
use super::selection::select_fleet;
use super::types::{FleetInfo, FleetSelection};
use crate::geo::{DistanceCalculator, LatLng};
use crate::reactive::{Subscription, Subscriptions};
use crate::retry::RetryPolicy;

/// Resolver tuning.
#[derive(Debug, Clone)]
pub struct FleetResolverConfig {
    /// Retry policy for the fleet list and location fetches.
    pub retry_policy: RetryPolicy,
    /// Fleet emitted when nothing else can be resolved.
    pub default_fleet: FleetInfo,
}

impl FleetResolverConfig {
    /// Whether `fleet` is this configuration's fallback fleet.
    pub fn is_default_fleet(&self, fleet: &FleetInfo) -> bool {
        *fleet == self.default_fleet
    }
}

impl Default for FleetResolverConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            default_fleet: FleetInfo::default_fleet(),
        }
    }
}

/// Resolves the operating fleet from the user's fleet selection.
///
/// For every selection the resolver subscribes to the fleet directory and
/// emits one resolved fleet per fleet list it receives. Failures never reach
/// the output: an unreachable directory or an unknown location resolves to
/// the default fleet.
///
/// Intended as one long-lived instance per app session. Call
/// [`shut_down`](Self::shut_down) once when it is no longer needed.
pub struct FleetResolver {
    context: Arc<ResolveContext>,
    shut_down: AtomicBool,
}

struct ResolveContext {
    directory: Arc<dyn FleetDirectory>,
    location: Arc<dyn LocationProvider>,
    distance: Arc<dyn DistanceCalculator>,
    config: FleetResolverConfig,
}

impl std::fmt::Debug for FleetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetResolver")
            .field("config", &self.context.config)
            .field("shut_down", &self.shut_down.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl FleetResolver {
    /// Create a resolver with the default configuration.
    pub fn new(
        directory: Arc<dyn FleetDirectory>,
        location: Arc<dyn LocationProvider>,
        distance: Arc<dyn DistanceCalculator>,
    ) -> Self {
        Self::with_config(directory, location, distance, FleetResolverConfig::default())
    }

    /// Create a resolver with explicit configuration.
    pub fn with_config(
        directory: Arc<dyn FleetDirectory>,
        location: Arc<dyn LocationProvider>,
        distance: Arc<dyn DistanceCalculator>,
        config: FleetResolverConfig,
    ) -> Self {
        Self {
            context: Arc::new(ResolveContext {
                directory,
                location,
                distance,
                config,
            }),
            shut_down: AtomicBool::new(false),
        }
    }

    /// The resolver's configuration.
    pub fn config(&self) -> &FleetResolverConfig {
        &self.context.config
    }

    /// Resolve the fleet for each selection `selections` emits.
    ///
    /// A new selection cancels the resolution of the previous one; nothing
    /// computed for a superseded selection is emitted after the new one
    /// arrives. The stream ends once `selections` has ended and the last
    /// resolution's fleet list subscription is complete. Dropping the stream
    /// cancels all in-flight work.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn resolve_fleet<S>(&self, selections: S) -> ResolvedFleetStream
    where
        S: Stream<Item = FleetSelection> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let emitter = Arc::new(Mutex::new(Emitter { generation: 0, tx }));
        let driver = tokio::spawn(drive(
            Box::pin(selections),
            Arc::clone(&self.context),
            emitter,
        ));

        let lifetime = Subscriptions::new();
        lifetime.add(Subscription::from_task(&driver));
        ResolvedFleetStream {
            fleets: WatchStream::new(rx),
            _lifetime: lifetime,
        }
    }

    /// Release the fleet directory. Only the first call has any effect.
    pub fn shut_down(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            tracing::warn!("Fleet resolver already shut down");
            return;
        }
        self.context.directory.destroy();
        tracing::info!("Fleet resolver shut down");
    }

    /// Whether [`shut_down`](Self::shut_down) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

/// Stream of resolved fleets returned by [`FleetResolver::resolve_fleet`].
///
/// Holds only the most recent resolution: a consumer that falls behind skips
/// straight to the latest fleet instead of queueing every intermediate one.
/// Never yields an error. Dropping it cancels the resolution.
pub struct ResolvedFleetStream {
    fleets: WatchStream<Option<FleetInfo>>,
    _lifetime: Subscriptions,
}

impl std::fmt::Debug for ResolvedFleetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedFleetStream")
            .field("lifetime", &self._lifetime)
            .finish_non_exhaustive()
    }
}

impl Stream for ResolvedFleetStream {
    type Item = FleetInfo;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match this.fleets.poll_next_unpin(cx) {
                // Initial placeholder before anything resolved
                Poll::Ready(Some(None)) => continue,
                Poll::Ready(Some(Some(fleet))) => return Poll::Ready(Some(fleet)),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Output side shared by every resolution of one `resolve_fleet` call.
///
/// Emitting checks the generation under the same lock that the driver bumps
/// it under, so a superseded resolution can never slip a value out.
struct Emitter {
    generation: u64,
    tx: watch::Sender<Option<FleetInfo>>,
}

impl Emitter {
    fn emit(emitter: &Mutex<Emitter>, generation: u64, fleet: FleetInfo) -> bool {
        let emitter = emitter.lock();
        if emitter.generation != generation {
            return false;
        }
        tracing::debug!(fleet_id = %fleet.id, phantom = fleet.is_phantom, "Fleet resolved");
        emitter.tx.send(Some(fleet)).is_ok()
    }
}

/// Switch-to-latest over the selection stream.
async fn drive(
    mut selections: Pin<Box<dyn Stream<Item = FleetSelection> + Send>>,
    context: Arc<ResolveContext>,
    emitter: Arc<Mutex<Emitter>>,
) {
    let in_flight = Subscriptions::new();
    let mut latest: Option<JoinHandle<()>> = None;

    while let Some(selection) = selections.next().await {
        let generation = {
            let mut emitter = emitter.lock();
            emitter.generation += 1;
            emitter.generation
        };
        in_flight.clear();

        tracing::debug!(%selection, generation, "Resolving fleet");
        let handle = tokio::spawn(resolve_selection(
            Arc::clone(&context),
            selection,
            generation,
            Arc::clone(&emitter),
        ));
        in_flight.add(Subscription::from_task(&handle));
        latest = Some(handle);
    }

    if let Some(handle) = latest {
        let _ = handle.await;
    }
}

/// Resolve one selection against every fleet list the directory emits.
async fn resolve_selection(
    context: Arc<ResolveContext>,
    selection: FleetSelection,
    generation: u64,
    emitter: Arc<Mutex<Emitter>>,
) {
    let default_fleet = &context.config.default_fleet;
    let mut fleets = Box::pin(
        context
            .config
            .retry_policy
            .retry_stream(|| context.directory.fleets()),
    );

    // Automatic selection always needs the location, so fetch it alongside
    // the first fleet list. Manual selection fetches it only on fallback.
    let mut location: Option<Option<LatLng>> = None;
    let mut next = if selection.is_automatic() {
        let (first, fix) = futures::future::join(fleets.next(), context.fetch_location()).await;
        location = Some(fix);
        first
    } else {
        fleets.next().await
    };

    let mut resolved_any = false;
    while let Some(item) = next {
        let list = match item {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "Fleet directory failed, using default fleet");
                vec![default_fleet.clone()]
            }
        };

        let needs_location = !matches!(
            &selection,
            FleetSelection::Manual(id) if list.iter().any(|fleet| &fleet.id == id)
        );
        if needs_location && location.is_none() {
            tracing::debug!(%selection, "Manual fleet not listed, resolving automatically");
            location = Some(context.fetch_location().await);
        }

        let fleet = select_fleet(
            &selection,
            &list,
            location.flatten(),
            context.distance.as_ref(),
            default_fleet,
        );
        if !Emitter::emit(&emitter, generation, fleet) {
            return;
        }
        resolved_any = true;
        next = fleets.next().await;
    }

    if !resolved_any {
        tracing::warn!("Fleet directory produced no fleet list, using default fleet");
        Emitter::emit(&emitter, generation, default_fleet.clone());
    }
}

impl ResolveContext {
    /// Last known location, or `None` once the retry budget is spent.
    async fn fetch_location(&self) -> Option<LatLng> {
        match self
            .config
            .retry_policy
            .retry(|| self.location.last_known_location())
            .await
        {
            Ok(fix) => Some(fix.location),
            Err(e) => {
                tracing::warn!(error = %e, "Device location unavailable");
                None
            }
        }
    }
}
