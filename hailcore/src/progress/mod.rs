//! Progress tracking for user-triggered asynchronous actions.
//!
//! A [`ProgressTracker`] guards one logical action (a "go online" switch, a
//! "request ride" button) so that it can never have two operations in flight,
//! and exposes the lifecycle of the current attempt to the UI.
//!
//! # State Machine
//!
//! ```text
//! Idle ----[follow_async_operation]----> Loading
//! Failed --[follow_async_operation]----> Loading
//! Loading --[operation Ok]-------------> Succeeded
//! Loading --[operation Err]------------> Failed
//! Loading --[subscription disposed]----> Idle
//! Loading/Succeeded --[follow_async_operation]--> (ignored)
//! ```
//!
//! The explicit setters (`idle`, `started`, `succeeded`, `failed`) bypass the
//! machine and overwrite the state unconditionally. An operation started after
//! such an override supersedes the earlier one, whose outcome or cancellation
//! no longer touches the state.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;

use crate::reactive::{distinct_until_changed, BehaviorSubject, Observable, Subscription};

/// Lifecycle stage of a tracked action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProgressState {
    /// Nothing has been attempted yet (or the last attempt was abandoned).
    #[default]
    Idle,
    /// An operation is in flight.
    Loading,
    /// The last operation completed successfully.
    Succeeded,
    /// The last operation failed; a new attempt may be started.
    Failed,
}

impl ProgressState {
    /// Whether `follow_async_operation` may start a new operation from here.
    pub fn accepts_new_operation(&self) -> bool {
        matches!(self, ProgressState::Idle | ProgressState::Failed)
    }

    /// User-facing label.
    pub fn display_status(&self) -> &'static str {
        match self {
            ProgressState::Idle => "Ready",
            ProgressState::Loading => "Working...",
            ProgressState::Succeeded => "Done",
            ProgressState::Failed => "Failed",
        }
    }
}

/// At-most-one-in-flight tracker for a single logical action.
///
/// Cloning produces another handle to the same tracker.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    state: Arc<BehaviorSubject<ProgressState>>,
    /// Id of the most recently started tracked operation. Only that
    /// operation may settle or revert the state.
    operation: Arc<Mutex<u64>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Create a tracker starting in [`ProgressState::Idle`].
    pub fn new() -> Self {
        Self::with_state(ProgressState::Idle)
    }

    /// Create a tracker starting in `initial`.
    pub fn with_state(initial: ProgressState) -> Self {
        Self {
            state: Arc::new(BehaviorSubject::new(initial)),
            operation: Arc::new(Mutex::new(0)),
        }
    }

    /// Current state.
    pub fn state(&self) -> ProgressState {
        self.state.get()
    }

    /// Force the state to `Idle`.
    pub fn idle(&self) {
        self.state.set(ProgressState::Idle);
    }

    /// Force the state to `Loading`.
    pub fn started(&self) {
        self.state.set(ProgressState::Loading);
    }

    /// Force the state to `Succeeded`.
    pub fn succeeded(&self) {
        self.state.set(ProgressState::Succeeded);
    }

    /// Force the state to `Failed`.
    pub fn failed(&self) {
        self.state.set(ProgressState::Failed);
    }

    /// Run `op` unless an operation is already loading or has succeeded.
    ///
    /// When the current state is `Idle` or `Failed` the tracker moves to
    /// `Loading` and spawns `op`; it then becomes `Succeeded` or `Failed`
    /// depending on the result. Otherwise `op` is dropped without being
    /// polled and an empty [`Subscription`] is returned.
    ///
    /// Disposing the returned subscription cancels `op` and, if the tracker
    /// is still `Loading` on behalf of `op`, returns it to `Idle`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn follow_async_operation<Fut, T, E>(&self, op: Fut) -> Subscription
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let id = {
            let mut operation = self.operation.lock();
            let started = self.state.update_if(|current| {
                current
                    .accepts_new_operation()
                    .then_some(ProgressState::Loading)
            });
            if !started {
                drop(operation);
                tracing::debug!(
                    state = ?self.state(),
                    "Operation already running or completed, ignoring"
                );
                return Subscription::empty();
            }
            *operation += 1;
            *operation
        };

        let mut guard = LoadingGuard {
            state: Arc::clone(&self.state),
            operation: Arc::clone(&self.operation),
            id,
            settled: false,
        };
        let task = tokio::spawn(async move {
            match op.await {
                Ok(_) => guard.settle(ProgressState::Succeeded),
                Err(e) => {
                    tracing::warn!(error = %e, "Tracked operation failed");
                    guard.settle(ProgressState::Failed);
                }
            }
        });
        Subscription::from_task(&task)
    }

    /// Stream of the current state followed by every transition.
    ///
    /// Consecutive duplicates are suppressed.
    pub fn observe_progress(&self) -> Observable<ProgressState> {
        distinct_until_changed(self.state.subscribe()).boxed()
    }
}

/// Reverts `Loading` to `Idle` if the operation is dropped before settling.
///
/// Both settling and reverting are skipped once a newer operation has
/// started.
struct LoadingGuard {
    state: Arc<BehaviorSubject<ProgressState>>,
    operation: Arc<Mutex<u64>>,
    id: u64,
    settled: bool,
}

impl LoadingGuard {
    fn settle(&mut self, outcome: ProgressState) {
        self.settled = true;
        let operation = self.operation.lock();
        if *operation != self.id {
            tracing::debug!(?outcome, "Superseded operation finished, state untouched");
            return;
        }
        self.state.set(outcome);
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let operation = self.operation.lock();
        if *operation != self.id {
            return;
        }
        let reverted = self.state.update_if(|current| {
            (*current == ProgressState::Loading).then_some(ProgressState::Idle)
        });
        if reverted {
            tracing::debug!("Tracked operation cancelled, back to idle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::oneshot;

    async fn next_state(stream: &mut Observable<ProgressState>) -> ProgressState {
        stream.next().await.expect("progress stream ended")
    }

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(ProgressTracker::new().state(), ProgressState::Idle);
        assert_eq!(ProgressTracker::default().state(), ProgressState::Idle);
    }

    #[test]
    fn test_injected_initial_state() {
        let tracker = ProgressTracker::with_state(ProgressState::Succeeded);
        assert_eq!(tracker.state(), ProgressState::Succeeded);
    }

    #[test]
    fn test_explicit_setters_overwrite() {
        let tracker = ProgressTracker::new();
        tracker.succeeded();
        assert_eq!(tracker.state(), ProgressState::Succeeded);
        tracker.started();
        assert_eq!(tracker.state(), ProgressState::Loading);
        tracker.failed();
        assert_eq!(tracker.state(), ProgressState::Failed);
        tracker.idle();
        assert_eq!(tracker.state(), ProgressState::Idle);
    }

    #[tokio::test]
    async fn test_success_transitions_in_order() {
        let tracker = ProgressTracker::new();
        let mut progress = tracker.observe_progress();

        tracker.follow_async_operation(async { Ok::<_, String>(42) });

        assert_eq!(next_state(&mut progress).await, ProgressState::Idle);
        assert_eq!(next_state(&mut progress).await, ProgressState::Loading);
        assert_eq!(next_state(&mut progress).await, ProgressState::Succeeded);
    }

    #[tokio::test]
    async fn test_failure_transitions_in_order() {
        let tracker = ProgressTracker::new();
        let mut progress = tracker.observe_progress();

        tracker.follow_async_operation(async { Err::<(), _>("network down") });

        assert_eq!(next_state(&mut progress).await, ProgressState::Idle);
        assert_eq!(next_state(&mut progress).await, ProgressState::Loading);
        assert_eq!(next_state(&mut progress).await, ProgressState::Failed);
    }

    #[tokio::test]
    async fn test_second_call_while_loading_is_ignored() {
        let tracker = ProgressTracker::new();
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, rx) = oneshot::channel::<()>();

        let calls_first = Arc::clone(&calls);
        let first = tracker.follow_async_operation(async move {
            calls_first.fetch_add(1, Ordering::SeqCst);
            rx.await.map_err(|e| e.to_string())
        });
        assert!(!first.is_empty());
        assert_eq!(tracker.state(), ProgressState::Loading);

        let calls_second = Arc::clone(&calls);
        let second = tracker.follow_async_operation(async move {
            calls_second.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        });
        assert!(second.is_empty());

        let mut progress = tracker.observe_progress();
        assert_eq!(next_state(&mut progress).await, ProgressState::Loading);
        tx.send(()).unwrap();
        assert_eq!(next_state(&mut progress).await, ProgressState::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_call_after_success_is_ignored() {
        let tracker = ProgressTracker::new();
        let calls = Arc::new(AtomicU32::new(0));
        let mut progress = tracker.observe_progress();

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            tracker.follow_async_operation(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            });
        }

        assert_eq!(next_state(&mut progress).await, ProgressState::Idle);
        assert_eq!(next_state(&mut progress).await, ProgressState::Loading);
        assert_eq!(next_state(&mut progress).await, ProgressState::Succeeded);

        let calls_again = Arc::clone(&calls);
        let sub = tracker.follow_async_operation(async move {
            calls_again.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        });
        assert!(sub.is_empty());
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_from_failed_starts_new_attempt() {
        let tracker = ProgressTracker::new();
        let calls = Arc::new(AtomicU32::new(0));
        let mut progress = tracker.observe_progress();
        assert_eq!(next_state(&mut progress).await, ProgressState::Idle);

        let calls_first = Arc::clone(&calls);
        tracker.follow_async_operation(async move {
            calls_first.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("timeout")
        });
        assert_eq!(next_state(&mut progress).await, ProgressState::Loading);
        assert_eq!(next_state(&mut progress).await, ProgressState::Failed);

        let calls_second = Arc::clone(&calls);
        let sub = tracker.follow_async_operation(async move {
            calls_second.fetch_add(1, Ordering::SeqCst);
            Ok::<_, &str>(())
        });
        assert!(!sub.is_empty());
        assert_eq!(next_state(&mut progress).await, ProgressState::Loading);
        assert_eq!(next_state(&mut progress).await, ProgressState::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dispose_in_flight_returns_to_idle() {
        let tracker = ProgressTracker::new();
        let mut progress = tracker.observe_progress();

        let sub = tracker.follow_async_operation(futures::future::pending::<Result<(), String>>());
        assert_eq!(next_state(&mut progress).await, ProgressState::Idle);
        assert_eq!(next_state(&mut progress).await, ProgressState::Loading);

        sub.dispose();
        assert_eq!(next_state(&mut progress).await, ProgressState::Idle);

        // Tracker accepts a new operation afterwards
        let retry = tracker.follow_async_operation(async { Ok::<_, String>(()) });
        assert!(!retry.is_empty());
    }

    #[tokio::test]
    async fn test_observe_suppresses_duplicates() {
        let tracker = ProgressTracker::new();
        let mut progress = tracker.observe_progress();

        tracker.idle();
        tracker.started();
        tracker.started();
        tracker.failed();
        tracker.failed();
        tracker.idle();

        let states: Vec<_> = progress.by_ref().take(4).collect().await;
        assert_eq!(
            states,
            vec![
                ProgressState::Idle,
                ProgressState::Loading,
                ProgressState::Failed,
                ProgressState::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn test_new_subscriber_sees_latest_state() {
        let tracker = ProgressTracker::new();
        tracker.failed();
        let mut progress = tracker.observe_progress();
        assert_eq!(next_state(&mut progress).await, ProgressState::Failed);
    }

    #[tokio::test]
    async fn test_disposing_superseded_operation_keeps_current_loading() {
        let tracker = ProgressTracker::new();
        let runs = Arc::new(AtomicU32::new(0));
        let pending = |runs: Arc<AtomicU32>| async move {
            runs.fetch_add(1, Ordering::SeqCst);
            futures::future::pending::<Result<(), String>>().await
        };

        let first = tracker.follow_async_operation(pending(Arc::clone(&runs)));
        tracker.idle();
        let second = tracker.follow_async_operation(pending(Arc::clone(&runs)));
        assert!(!second.is_empty());
        tokio::task::yield_now().await;

        first.dispose();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(tracker.state(), ProgressState::Loading);

        let third = tracker.follow_async_operation(pending(Arc::clone(&runs)));
        assert!(third.is_empty());
        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_superseded_operation_result_is_ignored() {
        let tracker = ProgressTracker::new();
        let (tx, rx) = oneshot::channel::<()>();

        let _first = tracker.follow_async_operation(async move {
            rx.await.map_err(|e| e.to_string())
        });
        tracker.failed();
        let _second =
            tracker.follow_async_operation(futures::future::pending::<Result<(), String>>());

        tx.send(()).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(tracker.state(), ProgressState::Loading);
    }

    #[test]
    fn test_display_status() {
        assert_eq!(ProgressState::Idle.display_status(), "Ready");
        assert_eq!(ProgressState::Loading.display_status(), "Working...");
        assert_eq!(ProgressState::Succeeded.display_status(), "Done");
        assert_eq!(ProgressState::Failed.display_status(), "Failed");
    }

    #[test]
    fn test_accepts_new_operation() {
        assert!(ProgressState::Idle.accepts_new_operation());
        assert!(ProgressState::Failed.accepts_new_operation());
        assert!(!ProgressState::Loading.accepts_new_operation());
        assert!(!ProgressState::Succeeded.accepts_new_operation());
    }
}
