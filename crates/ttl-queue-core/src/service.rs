//! Queue-side half of the service façade.
//!
//! [`QueueService`] owns the one queue a server instance works with. Every
//! public operation takes the lock once, reads the clock once, sweeps, and
//! then performs the operation, so concurrent callers always observe a
//! consistent queue and never see an entry that expired before their call.

use crate::clock::Clock;
use crate::queue::{SweepMode, TtlQueue};
use crate::{Timestamp, Ttl, ValidationError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

/// Snapshot of the queue after a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Live-or-not-yet-swept entries
    pub size: usize,
}

/// Shared, lock-protected TTL queue with an injected time source
pub struct QueueService<T> {
    queue: Mutex<TtlQueue<T>>,
    clock: Arc<dyn Clock>,
    sweep_mode: SweepMode,
}

impl<T> QueueService<T> {
    /// Create a service around an empty queue
    pub fn new(clock: Arc<dyn Clock>, sweep_mode: SweepMode) -> Self {
        Self {
            queue: Mutex::new(TtlQueue::new()),
            clock,
            sweep_mode,
        }
    }

    /// Sweep strategy in use
    pub fn sweep_mode(&self) -> SweepMode {
        self.sweep_mode
    }

    /// Report the post-sweep size
    pub fn status(&self) -> QueueStatus {
        let (queue, _now) = self.swept();
        QueueStatus { size: queue.len() }
    }

    /// Push a payload that expires `ttl` after now
    ///
    /// Returns the absolute expiration time. Fails only when that time cannot
    /// be represented; the queue is left untouched apart from the sweep.
    pub fn push(&self, ttl: Ttl, payload: T) -> Result<Timestamp, ValidationError> {
        let (mut queue, now) = self.swept();
        let expires_at = now.checked_add_ttl(ttl)?;
        queue.push(payload, expires_at);

        debug!(
            ttl_ms = ttl.as_millis(),
            expires_at = %expires_at,
            size = queue.len(),
            "Pushed entry"
        );
        Ok(expires_at)
    }

    /// Entries currently held, without sweeping
    ///
    /// Unlike [`status`](Self::status) this may count expired entries that
    /// no sweep has reached yet. Meant for logging only.
    pub fn held(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Lock the queue, read the clock and sweep
    ///
    /// A poisoned lock is recovered: no queue operation can panic halfway
    /// through a mutation.
    fn swept(&self) -> (MutexGuard<'_, TtlQueue<T>>, Timestamp) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        let purged = queue.sweep_with(self.sweep_mode, &now);
        if purged > 0 {
            debug!(purged, remaining = queue.len(), "Swept expired entries");
        }
        (queue, now)
    }
}

impl<T: Clone> QueueService<T> {
    /// Copy of the live head payload, if any
    pub fn peek(&self) -> Option<T> {
        let (queue, _now) = self.swept();
        queue.peek().map(|head| head.payload().clone())
    }

    /// Remove the live head and return a copy of its payload
    pub fn pop(&self) -> Option<T> {
        let (mut queue, _now) = self.swept();
        let payload = queue.peek().map(|head| head.payload().clone());
        queue.pop();
        payload
    }
}
