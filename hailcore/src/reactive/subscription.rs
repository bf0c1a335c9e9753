//! Cancellable handles for background work.

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

/// Handle to a piece of background work.
///
/// `dispose()` cancels the work. Dropping the handle detaches it; the work
/// keeps running to completion. An empty subscription represents work that
/// was never started.
#[derive(Debug, Default)]
pub struct Subscription {
    handle: Option<AbortHandle>,
}

impl Subscription {
    /// A subscription with nothing behind it.
    pub fn empty() -> Self {
        Self { handle: None }
    }

    /// Track a spawned task.
    pub fn from_task<T>(task: &JoinHandle<T>) -> Self {
        Self {
            handle: Some(task.abort_handle()),
        }
    }

    /// Whether this subscription never had any work attached.
    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    /// Whether the work has finished, been cancelled, or never existed.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, AbortHandle::is_finished)
    }

    /// Cancel the work.
    pub fn dispose(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

/// A set of subscriptions disposed together.
///
/// Dropping the set disposes every member, so a screen scope only needs to
/// hold one of these to tear down all of its background work.
#[derive(Debug, Default)]
pub struct Subscriptions {
    members: Mutex<Vec<Subscription>>,
}

impl Subscriptions {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription to the set. Empty subscriptions are ignored.
    pub fn add(&self, subscription: Subscription) {
        if subscription.is_empty() {
            return;
        }
        let mut members = self.members.lock();
        members.retain(|s| !s.is_finished());
        members.push(subscription);
    }

    /// Dispose every member and empty the set. The set stays usable.
    pub fn clear(&self) {
        let members = std::mem::take(&mut *self.members.lock());
        for subscription in &members {
            subscription.dispose();
        }
    }

    /// Number of members that are still running.
    pub fn active_count(&self) -> usize {
        self.members
            .lock()
            .iter()
            .filter(|s| !s.is_finished())
            .count()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        for subscription in self.members.get_mut().iter() {
            subscription.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_empty_subscription() {
        let sub = Subscription::empty();
        assert!(sub.is_empty());
        assert!(sub.is_finished());
        sub.dispose(); // no-op
    }

    #[tokio::test]
    async fn test_dispose_cancels_task() {
        let reached = Arc::new(AtomicBool::new(false));
        let reached_clone = Arc::clone(&reached);
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            reached_clone.store(true, Ordering::SeqCst);
        });

        let sub = Subscription::from_task(&task);
        assert!(!sub.is_finished());
        sub.dispose();

        assert!(task.await.unwrap_err().is_cancelled());
        assert!(sub.is_finished());
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_subscriptions_clear_disposes_all() {
        let set = Subscriptions::new();
        let first = tokio::spawn(futures::future::pending::<()>());
        let second = tokio::spawn(futures::future::pending::<()>());
        set.add(Subscription::from_task(&first));
        set.add(Subscription::from_task(&second));
        set.add(Subscription::empty());
        assert_eq!(set.active_count(), 2);

        set.clear();

        assert!(first.await.unwrap_err().is_cancelled());
        assert!(second.await.unwrap_err().is_cancelled());
        assert_eq!(set.active_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriptions_drop_disposes_all() {
        let task = tokio::spawn(futures::future::pending::<()>());
        {
            let set = Subscriptions::new();
            set.add(Subscription::from_task(&task));
        }
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
