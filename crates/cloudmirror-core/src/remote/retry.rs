//! Bounded retry with linear backoff

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{RemoteResult, RemoteStoreError};

/// How often and how patiently a remote call is retried
///
/// Attempt `n` (1-based) that fails with a transient error is followed by a
/// pause of `step × n` before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Backoff increment per failed attempt
    pub step: Duration,
}

/// Retries ran out, or the error was permanent
#[derive(Debug)]
pub struct Exhausted {
    /// Attempts actually made
    pub attempts: u32,
    /// Error from the last attempt
    pub source: RemoteStoreError,
}

impl RetryPolicy {
    /// Policy with linear backoff
    #[must_use]
    pub const fn linear(max_attempts: u32, step: Duration) -> Self {
        Self { max_attempts, step }
    }

    /// `max_attempts` attempts with no delay between them
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::linear(max_attempts, Duration::ZERO)
    }

    /// Delay after the given failed attempt (1-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds, fails permanently or attempts run out
    ///
    /// # Errors
    ///
    /// Returns [`Exhausted`] carrying the last error.
    pub fn run<T>(
        &self,
        operation: &str,
        mut op: impl FnMut() -> RemoteResult<T>,
    ) -> Result<T, Exhausted> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(source) if attempt < max_attempts && source.is_transient() => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        error = %source,
                        "Remote call failed, retrying"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(source) => {
                    return Err(Exhausted {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}

/// Retry policies for each class of remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicies {
    /// Enumeration during incremental ticks
    pub listing: RetryPolicy,
    /// Enumeration during initial synchronization and its validation
    pub initial_listing: RetryPolicy,
    /// Single-file uploads
    pub upload: RetryPolicy,
}

impl RetryPolicies {
    /// Same attempt counts as the defaults, with no delay
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            listing: RetryPolicy::immediate(3),
            initial_listing: RetryPolicy::immediate(5),
            upload: RetryPolicy::immediate(3),
        }
    }
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            listing: RetryPolicy::linear(3, Duration::from_secs(5)),
            initial_listing: RetryPolicy::linear(5, Duration::from_secs(5)),
            upload: RetryPolicy::linear(3, Duration::from_secs(2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_linear_delays() {
        let policy = RetryPolicy::linear(3, Duration::from_secs(5));
        assert_eq!(policy.delay_after(1), Duration::from_secs(5));
        assert_eq!(policy.delay_after(2), Duration::from_secs(10));
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = RetryPolicy::immediate(3).run("list", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(RemoteStoreError::Transport("reset".into()))
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_exhaustion_reports_attempts() {
        let calls = Cell::new(0);
        let err = RetryPolicy::immediate(4)
            .run("upload", || -> RemoteResult<()> {
                calls.set(calls.get() + 1);
                Err(RemoteStoreError::RateLimited("slow down".into()))
            })
            .unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let calls = Cell::new(0);
        let err = RetryPolicy::immediate(5)
            .run("upload", || -> RemoteResult<()> {
                calls.set(calls.get() + 1);
                Err(RemoteStoreError::Unauthorized("bad token".into()))
            })
            .unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let _ = RetryPolicy::immediate(0).run("list", || -> RemoteResult<()> {
            calls.set(calls.get() + 1);
            Ok(())
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_default_policies() {
        let policies = RetryPolicies::default();
        assert_eq!(policies.listing.max_attempts, 3);
        assert_eq!(policies.initial_listing.max_attempts, 5);
        assert_eq!(policies.upload.step, Duration::from_secs(2));
    }
}
