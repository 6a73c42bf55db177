//! Pauses inserted between remote mutations to stay under rate limits

use std::thread;
use std::time::Duration;

/// Pause durations between remote mutations
///
/// A zero duration never sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Before each rename
    pub item: Duration,
    /// Between reconciliation steps
    pub step: Duration,
    /// After the destructive wipe of initial sync
    pub after_wipe: Duration,
    /// After the bulk upload of initial sync
    pub after_bulk_upload: Duration,
}

impl Pacing {
    /// No pauses at all
    #[must_use]
    pub const fn none() -> Self {
        Self {
            item: Duration::ZERO,
            step: Duration::ZERO,
            after_wipe: Duration::ZERO,
            after_bulk_upload: Duration::ZERO,
        }
    }

    /// Sleep for `duration` unless it is zero
    pub fn pause(duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            item: Duration::from_millis(1000),
            step: Duration::from_millis(5000),
            after_wipe: Duration::from_millis(10_000),
            after_bulk_upload: Duration::from_millis(15_000),
        }
    }
}
