//! Module: retry
//! Responsibility: bounded retry of operations against unreliable backends.
//! Does not own: deciding which failures are transient; callers declare kinds.

use crate::obs::sink::{self, MetricsEvent};
use std::{fmt, thread, time::Duration};
use tracing::{debug, warn};

///
/// ErrorKind
///
/// A failure kind that may refine a broader kind. A kind matches every
/// ancestor reachable through `parent`.
///

pub trait ErrorKind: Copy + Eq + fmt::Debug {
    fn parent(self) -> Option<Self>;

    fn is_a(self, ancestor: Self) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }

        false
    }
}

///
/// Classify
///
/// Errors that expose a kind for retry decisions. `None` never retries.
///

pub trait Classify {
    type Kind: ErrorKind;

    fn kind(&self) -> Option<Self::Kind>;
}

///
/// RetryPolicy
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn run<T, E, F>(&self, retryable: &[E::Kind], operation: F) -> Result<T, E>
    where
        E: Classify,
        F: FnMut() -> Result<T, E>,
    {
        run_with_retry(operation, retryable, self.max_attempts, self.interval)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::DEFAULT_PERSIST_ATTEMPTS, Duration::from_millis(100))
    }
}

/// Run `operation` until it succeeds, fails with a kind outside `retryable`,
/// or `max_attempts` attempts have failed.
///
/// The first call is attempt 1; a budget below 1 still runs once. The last
/// error is returned unchanged.
pub fn run_with_retry<T, E, F>(
    mut operation: F,
    retryable: &[E::Kind],
    max_attempts: u32,
    interval: Duration,
) -> Result<T, E>
where
    E: Classify,
    F: FnMut() -> Result<T, E>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match operation() {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let Some(kind) = err.kind().filter(|kind| is_retryable(*kind, retryable)) else {
            return Err(err);
        };
        if attempt >= max_attempts {
            warn!(attempt, max_attempts, ?kind, "retry budget exhausted");
            return Err(err);
        }

        warn!(attempt, max_attempts, ?kind, "retrying after failure");
        sink::record(MetricsEvent::RetryAttempt);
        if !interval.is_zero() {
            thread::sleep(interval);
        }
        attempt += 1;
    }
}

fn is_retryable<K: ErrorKind>(kind: K, retryable: &[K]) -> bool {
    retryable.iter().any(|declared| kind.is_a(*declared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StorageError, StorageErrorKind};
    use std::cell::Cell;
    use tracing_test::traced_test;

    const TRANSIENT: &[StorageErrorKind] = &[StorageErrorKind::Transient];

    fn failing(calls: &Cell<u32>, kind: StorageErrorKind) -> Result<(), StorageError> {
        calls.set(calls.get() + 1);
        Err(StorageError::new(kind, format!("failure {}", calls.get())))
    }

    #[test]
    fn retryable_failure_uses_every_attempt_and_returns_the_last_error() {
        let calls = Cell::new(0);

        let err = run_with_retry(
            || failing(&calls, StorageErrorKind::Transient),
            TRANSIENT,
            5,
            Duration::ZERO,
        )
        .expect_err("operation never succeeds");

        assert_eq!(calls.get(), 5, "five attempts expected");
        assert_eq!(err.message, "failure 5", "last error must propagate unchanged");
    }

    #[test]
    fn subkind_of_declared_kind_is_retried() {
        let calls = Cell::new(0);

        let err = run_with_retry(
            || failing(&calls, StorageErrorKind::ConnectionLost),
            TRANSIENT,
            5,
            Duration::ZERO,
        )
        .expect_err("operation never succeeds");

        assert_eq!(calls.get(), 5);
        assert_eq!(err.kind, StorageErrorKind::ConnectionLost);
    }

    #[test]
    fn undeclared_failure_runs_exactly_once() {
        let calls = Cell::new(0);

        let err = run_with_retry(
            || failing(&calls, StorageErrorKind::Conflict),
            TRANSIENT,
            5,
            Duration::ZERO,
        )
        .expect_err("operation never succeeds");

        assert_eq!(calls.get(), 1, "non-retryable failures must not consume attempts");
        assert_eq!(err.message, "failure 1");
    }

    #[test]
    fn success_after_transient_failures_stops_retrying() {
        let calls = Cell::new(0);

        let value = run_with_retry(
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(StorageError::transient("busy"))
                } else {
                    Ok(calls.get())
                }
            },
            TRANSIENT,
            5,
            Duration::ZERO,
        )
        .expect("third attempt succeeds");

        assert_eq!(value, 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn zero_attempt_budget_still_runs_once() {
        let calls = Cell::new(0);

        let _ = run_with_retry(
            || failing(&calls, StorageErrorKind::Transient),
            TRANSIENT,
            0,
            Duration::ZERO,
        );

        assert_eq!(calls.get(), 1);
    }

    #[test]
    #[traced_test]
    fn retries_are_logged() {
        let calls = Cell::new(0);

        let _ = RetryPolicy::new(2, Duration::ZERO)
            .run(TRANSIENT, || failing(&calls, StorageErrorKind::LockTimeout));

        assert!(logs_contain("retrying after failure"));
        assert!(logs_contain("retry budget exhausted"));
    }
}
