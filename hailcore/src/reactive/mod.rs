//! Reactive building blocks.
//!
//! Two primitives carry every stream in the crate:
//!
//! - [`BehaviorSubject`]: multicast stream that replays the latest value to
//!   each new subscriber, then delivers every later value in order.
//! - [`PublishSubject`]: multicast event stream with no replay.
//!
//! Lifetimes of background work are tracked with [`Subscription`] handles,
//! grouped into a [`Subscriptions`] set that is disposed as a unit when the
//! owning screen scope is torn down.
//!
//! # Example
//!
//! ```ignore
//! use hailcore::reactive::BehaviorSubject;
//! use futures::StreamExt;
//!
//! let subject = BehaviorSubject::new(1);
//! let mut stream = subject.subscribe();
//! subject.set(2);
//!
//! assert_eq!(stream.next().await, Some(1)); // replayed
//! assert_eq!(stream.next().await, Some(2)); // live
//! ```

mod subject;
mod subscription;

pub use subject::{distinct_until_changed, BehaviorSubject, Observable, PublishSubject};
pub use subscription::{Subscription, Subscriptions};

/// Buffer size of the broadcast channel behind each subject.
///
/// A subscriber that falls further behind than this skips ahead and the gap
/// is logged.
pub const DEFAULT_SUBJECT_CAPACITY: usize = 64;
