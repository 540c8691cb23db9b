//! Time sources for expiration decisions.

use crate::Timestamp;
use std::sync::{Mutex, PoisonError};

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;

/// Source of the current time
///
/// The queue service asks its clock for `now` once per operation, so the sweep
/// and the operation that follows it agree on a single instant.
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock that only moves when told to
///
/// Used to drive expiration deterministically in tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a clock frozen at the given Unix millisecond
    ///
    /// Falls back to the Unix epoch when the value is out of range.
    pub fn at_unix_millis(millis: i64) -> Self {
        let start = Timestamp::from_unix_millis(millis).unwrap_or_else(|| {
            Timestamp::from_datetime(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH)
        });
        Self::new(start)
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Move forward (or backward, for negative values) by `millis`
    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = chrono::Duration::try_milliseconds(millis)
            .and_then(|delta| now.as_datetime().checked_add_signed(delta))
        {
            *now = Timestamp::from_datetime(next);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
