//! FIFO queue whose entries expire at absolute timestamps.
//!
//! The queue never looks at the clock by itself. Callers pass `now` to one of
//! the sweep operations before any observable read or write, which keeps
//! expired entries from ever being returned or counted.
//!
//! Entries are stored in a ring buffer: slot order is link order, the front
//! slot is the head and the back slot is the tail. Appending at the tail and
//! removing the head are both O(1), and an empty buffer has neither head nor
//! tail.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

// ============================================================================
// Entry
// ============================================================================

/// One queued item
///
/// There is no `next` link: an entry's successor is the entry in the
/// following slot of the owning [`TtlQueue`], and the tail is the back slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    payload: T,
    expires_at: Timestamp,
}

impl<T> Entry<T> {
    fn new(payload: T, expires_at: Timestamp) -> Self {
        Self {
            payload,
            expires_at,
        }
    }

    /// Opaque payload, exactly as pushed
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Absolute expiration time
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Whether the entry is dead at `now`
    ///
    /// The comparison is strict: an entry expiring exactly at `now` is still
    /// live.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        self.expires_at < *now
    }

    /// Consume the entry and return its payload
    pub fn into_payload(self) -> T {
        self.payload
    }
}

// ============================================================================
// Sweep Mode
// ============================================================================

/// Strategy used to purge expired entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Pop from the head while the head is expired.
    ///
    /// Expired entries queued behind a live head stay in memory until they
    /// reach the head themselves.
    #[default]
    HeadOnly,

    /// Remove every expired entry, keeping the survivors in order.
    Full,
}

// ============================================================================
// TtlQueue
// ============================================================================

/// Unbounded FIFO queue of expiring entries
#[derive(Debug, Clone)]
pub struct TtlQueue<T> {
    entries: VecDeque<Entry<T>>,
}

impl<T> TtlQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append an entry at the tail
    pub fn push(&mut self, payload: T, expires_at: Timestamp) {
        self.entries.push_back(Entry::new(payload, expires_at));
    }

    /// Remove the head entry, if any
    ///
    /// Popping an empty queue is a no-op.
    pub fn pop(&mut self) {
        self.entries.pop_front();
    }

    /// Current head entry without removing it
    pub fn peek(&self) -> Option<&Entry<T>> {
        self.entries.front()
    }

    /// Number of linked entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.iter()
    }

    /// Pop expired entries from the head until a live head is found or the
    /// queue is empty
    ///
    /// Returns the number of entries purged.
    pub fn sweep(&mut self, now: &Timestamp) -> usize {
        let mut purged = 0;
        while self.peek().is_some_and(|head| head.is_expired_at(now)) {
            self.pop();
            purged += 1;
        }
        purged
    }

    /// Remove every expired entry wherever it sits in the queue
    ///
    /// Returns the number of entries purged.
    pub fn sweep_all(&mut self, now: &Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    /// Sweep using the given strategy
    pub fn sweep_with(&mut self, mode: SweepMode, now: &Timestamp) -> usize {
        match mode {
            SweepMode::HeadOnly => self.sweep(now),
            SweepMode::Full => self.sweep_all(now),
        }
    }
}

impl<T> Default for TtlQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
