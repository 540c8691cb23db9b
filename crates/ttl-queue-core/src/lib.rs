//! # TTL Queue Core
//!
//! Core data structures for a volatile, in-memory FIFO queue where every entry
//! carries an absolute expiration time.
//!
//! Expired entries are never purged by a background timer. Instead the caller
//! runs a sweep before every externally observable operation, which pops
//! expired entries from the head of the queue until a live entry is found.
//!
//! ## Architecture
//!
//! - [`queue::TtlQueue`] is the leaf collection with push / pop / peek and the
//!   sweep operations. It has no knowledge of time sources or transport.
//! - [`service::QueueService`] owns one queue behind a lock, reads the current
//!   time from an injected [`Clock`] and runs sweep-then-operate atomically.
//!
//! ## Usage
//!
//! ```rust
//! use ttl_queue_core::{Timestamp, TtlQueue};
//!
//! let now = Timestamp::from_unix_millis(1_000).unwrap();
//! let mut queue = TtlQueue::new();
//! queue.push("payload", Timestamp::from_unix_millis(1_500).unwrap());
//!
//! assert_eq!(queue.sweep(&now), 0);
//! assert_eq!(queue.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod clock;
pub mod queue;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use queue::{Entry, SweepMode, TtlQueue};
pub use service::{QueueService, QueueStatus};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

// ============================================================================
// Time Types
// ============================================================================

/// Absolute point in time used for entry expiration
///
/// Ordering is total, so two timestamps can always be compared. This is what
/// makes every entry's expiration decidable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Create timestamp from milliseconds since the Unix epoch
    ///
    /// Returns `None` when the value is outside the supported date range.
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Milliseconds since the Unix epoch
    pub fn as_unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Absolute expiration time for an entry pushed at `self` with the given TTL
    ///
    /// Fails when the result cannot be represented, e.g. for TTLs of several
    /// hundred thousand years.
    pub fn checked_add_ttl(&self, ttl: Ttl) -> Result<Self, ValidationError> {
        chrono::Duration::try_milliseconds(ttl.as_millis())
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "ttl".to_string(),
                message: format!(
                    "{} ms from {} is outside the supported time range",
                    ttl.as_millis(),
                    self.to_rfc3339()
                ),
            })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Relative time-to-live in milliseconds
///
/// Negative values are accepted and produce an expiration in the past, so the
/// entry is purged by the next sweep that reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ttl(i64);

impl Ttl {
    /// Create TTL from a millisecond count
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Get TTL as milliseconds
    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl FromStr for Ttl {
    type Err = ValidationError;

    /// Parse a TTL from text such as a URL path segment
    ///
    /// Integers are taken as-is. Finite decimal and exponent forms (`2.5`,
    /// `1e3`) are truncated toward zero. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "ttl".to_string(),
            });
        }

        if let Ok(millis) = trimmed.parse::<i64>() {
            return Ok(Self(millis));
        }

        let value = trimmed
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "ttl".to_string(),
                message: format!("'{}' is not a number of milliseconds", trimmed),
            })?;

        if !value.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: "ttl".to_string(),
                message: format!("'{}' is not a finite number", trimmed),
            });
        }

        let truncated = value.trunc();
        if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
            return Err(ValidationError::OutOfRange {
                field: "ttl".to_string(),
                message: format!("'{}' does not fit in a 64-bit millisecond count", trimmed),
            });
        }

        Ok(Self(truncated as i64))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error type for input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' is out of range: {message}")]
    OutOfRange { field: String, message: String },
}

impl ValidationError {
    /// Name of the field that failed validation
    pub fn field(&self) -> &str {
        match self {
            Self::Required { field }
            | Self::InvalidFormat { field, .. }
            | Self::OutOfRange { field, .. } => field,
        }
    }
}
