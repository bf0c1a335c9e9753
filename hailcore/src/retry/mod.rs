//! Bounded retry policy.
//!
//! A [`RetryPolicy`] turns a retry budget into a resubscription policy. Each
//! error a failing operation produces is either answered with a retry signal
//! (the operation is started again) or, once the budget is spent, forwarded
//! unchanged as the terminal failure.
//!
//! There is deliberately no delay or backoff between attempts.
//!
//! # Example
//!
//! ```ignore
//! use hailcore::retry::RetryPolicy;
//!
//! // Up to 3 retries: 4 attempts in total
//! let fleets = RetryPolicy::retry_at_most(3)
//!     .retry(|| directory.fetch_once())
//!     .await?;
//! ```

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

/// Retry budget used for network-bound calls across the crate.
pub const RETRY_COUNT: u32 = 3;

/// How many times a failing operation may be restarted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::retry_at_most(RETRY_COUNT)
    }
}

/// Outcome of feeding one error into a [`RetryBudget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision<E> {
    /// Restart the operation.
    Retry,
    /// Budget exhausted; propagate this (original) error.
    Fail(E),
}

impl<E> RetryDecision<E> {
    /// Whether this decision is a retry signal.
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry)
    }
}

/// Error counter for one subscription to a failing operation.
#[derive(Debug, Clone)]
pub struct RetryBudget {
    max_retries: u32,
    errors_seen: u32,
}

impl RetryBudget {
    /// Count an error and decide what to do with it.
    ///
    /// Errors 1..=n yield [`RetryDecision::Retry`]; error n+1 and any later
    /// error yield [`RetryDecision::Fail`] carrying the same value.
    pub fn on_error<E>(&mut self, error: E) -> RetryDecision<E> {
        self.errors_seen = self.errors_seen.saturating_add(1);
        if self.errors_seen <= self.max_retries {
            RetryDecision::Retry
        } else {
            RetryDecision::Fail(error)
        }
    }

    /// Number of errors counted so far.
    pub fn errors_seen(&self) -> u32 {
        self.errors_seen
    }

    /// Whether the next error will be terminal.
    pub fn is_exhausted(&self) -> bool {
        self.errors_seen >= self.max_retries
    }
}

impl RetryPolicy {
    /// Allow up to `max_retries` restarts; the next error is terminal.
    pub const fn retry_at_most(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Fail on the first error. Same as `retry_at_most(0)`.
    pub const fn never_retry() -> Self {
        Self::retry_at_most(0)
    }

    /// Maximum number of restarts.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Maximum number of attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// A fresh error counter for one subscription.
    pub fn budget(&self) -> RetryBudget {
        RetryBudget {
            max_retries: self.max_retries,
            errors_seen: 0,
        }
    }

    /// Transform an error stream into its companion retry-signal stream.
    ///
    /// Emits `Ok(())` for each of the first `n` errors and then the next
    /// error as `Err` before ending. Ends early if `errors` ends.
    pub fn retry_signals<S, E>(&self, errors: S) -> impl Stream<Item = Result<(), E>>
    where
        S: Stream<Item = E>,
    {
        let state = (Box::pin(errors), self.budget(), false);
        stream::unfold(state, |(mut errors, mut budget, done)| async move {
            if done {
                return None;
            }
            let error = errors.next().await?;
            match budget.on_error(error) {
                RetryDecision::Retry => Some((Ok(()), (errors, budget, false))),
                RetryDecision::Fail(error) => Some((Err(error), (errors, budget, true))),
            }
        })
    }

    /// Run `op`, restarting it on failure until the budget is spent.
    ///
    /// `op` is called once per attempt. The returned error is the one from
    /// the final attempt.
    pub async fn retry<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut budget = self.budget();
        loop {
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            tracing::debug!(
                attempt = budget.errors_seen() + 1,
                max_attempts = self.max_attempts(),
                error = %error,
                "Operation failed"
            );
            if let RetryDecision::Fail(error) = budget.on_error(error) {
                tracing::warn!(
                    attempts = budget.errors_seen(),
                    error = %error,
                    "Retry budget exhausted"
                );
                return Err(error);
            }
        }
    }

    /// Stream flavour of [`retry`](Self::retry).
    ///
    /// `factory` creates a new subscription to the source. `Ok` items pass
    /// through. An `Err` item either triggers a resubscription or, once the
    /// budget is spent, is emitted as the final item. The budget counts
    /// errors over the whole lifetime of the returned stream.
    pub fn retry_stream<F, S, T, E>(&self, factory: F) -> impl Stream<Item = Result<T, E>>
    where
        F: FnMut() -> S,
        S: Stream<Item = Result<T, E>>,
        E: Display,
    {
        let state = RetryStreamState {
            factory,
            current: None,
            budget: self.budget(),
            max_attempts: self.max_attempts(),
            done: false,
        };
        stream::unfold(state, |mut state| async move {
            loop {
                if state.done {
                    return None;
                }
                if state.current.is_none() {
                    state.current = Some(Box::pin((state.factory)()));
                }
                let Some(current) = state.current.as_mut() else {
                    return None;
                };
                match current.next().await {
                    Some(Ok(item)) => return Some((Ok(item), state)),
                    Some(Err(error)) => {
                        tracing::debug!(
                            attempt = state.budget.errors_seen() + 1,
                            max_attempts = state.max_attempts,
                            error = %error,
                            "Stream failed"
                        );
                        state.current = None;
                        if let RetryDecision::Fail(error) = state.budget.on_error(error) {
                            tracing::warn!(
                                attempts = state.budget.errors_seen(),
                                error = %error,
                                "Retry budget exhausted"
                            );
                            state.done = true;
                            return Some((Err(error), state));
                        }
                    }
                    None => return None,
                }
            }
        })
    }
}

struct RetryStreamState<F, S> {
    factory: F,
    current: Option<Pin<Box<S>>>,
    budget: RetryBudget,
    max_attempts: u32,
    done: bool,
}
