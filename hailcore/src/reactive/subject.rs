//! Replay-latest and publish-only multicast subjects.

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use super::DEFAULT_SUBJECT_CAPACITY;

/// Boxed, owned stream handed out by subjects.
pub type Observable<T> = BoxStream<'static, T>;

/// Multicast stream holding a current value.
///
/// Setting a value and taking a subscription both happen under the same
/// lock, so a subscriber sees the snapshot followed by every value set after
/// it, without gaps or duplicates.
pub struct BehaviorSubject<T> {
    current: Mutex<T>,
    tx: broadcast::Sender<T>,
}

impl<T> BehaviorSubject<T>
where
    T: Clone + Send + 'static,
{
    /// Create a subject with an initial value.
    pub fn new(initial: T) -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_SUBJECT_CAPACITY);
        Self {
            current: Mutex::new(initial),
            tx,
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.current.lock().clone()
    }

    /// Replace the current value and broadcast it.
    pub fn set(&self, value: T) {
        let mut current = self.current.lock();
        *current = value.clone();
        // No receivers is fine: the value is still retained for replay
        let _ = self.tx.send(value);
    }

    /// Atomically inspect the current value and optionally replace it.
    ///
    /// `f` runs with the lock held. Returning `Some` stores and broadcasts the
    /// new value. Returns whether a value was stored.
    pub fn update_if<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> Option<T>,
    {
        let mut current = self.current.lock();
        match f(&current) {
            Some(next) => {
                *current = next.clone();
                let _ = self.tx.send(next);
                true
            }
            None => false,
        }
    }

    /// Stream of the current value followed by every later value.
    pub fn subscribe(&self) -> Observable<T> {
        let current = self.current.lock();
        let rx = self.tx.subscribe();
        let snapshot = current.clone();
        drop(current);

        stream::once(future::ready(snapshot))
            .chain(live(rx))
            .boxed()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T> std::fmt::Debug for BehaviorSubject<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorSubject")
            .field("current", &*self.current.lock())
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

/// Multicast event stream without replay.
///
/// Subscribers receive only values emitted after they subscribed.
pub struct PublishSubject<T> {
    tx: broadcast::Sender<T>,
}

impl<T> PublishSubject<T>
where
    T: Clone + Send + 'static,
{
    /// Create an empty subject.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_SUBJECT_CAPACITY);
        Self { tx }
    }

    /// Emit a value to every current subscriber.
    ///
    /// Returns the number of subscribers that received it.
    pub fn emit(&self, value: T) -> usize {
        self.tx.send(value).unwrap_or(0)
    }

    /// Stream of values emitted from now on.
    pub fn subscribe(&self) -> Observable<T> {
        live(self.tx.subscribe()).boxed()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T> Default for PublishSubject<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for PublishSubject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishSubject")
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

/// Adapt a broadcast receiver into a stream, skipping over lag gaps.
fn live<T>(rx: broadcast::Receiver<T>) -> impl futures::Stream<Item = T> + Send + 'static
where
    T: Clone + Send + 'static,
{
    BroadcastStream::new(rx).filter_map(|item| {
        future::ready(match item {
            Ok(value) => Some(value),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Subscriber lagged behind subject, values dropped");
                None
            }
        })
    })
}

/// Suppress consecutive duplicate items.
pub fn distinct_until_changed<S, T>(source: S) -> impl futures::Stream<Item = T>
where
    S: futures::Stream<Item = T>,
    T: PartialEq + Clone,
{
    source
        .scan(None::<T>, |last, item| {
            let emit = if last.as_ref() == Some(&item) {
                None
            } else {
                *last = Some(item.clone());
                Some(item)
            };
            future::ready(Some(emit))
        })
        .filter_map(future::ready)
}
