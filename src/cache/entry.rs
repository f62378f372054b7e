//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == TTL Sentinel ==
/// Expiration policy for a single `set`/`add`/`replace` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Use the expiration the cache was configured with
    Default,
    /// The entry never expires
    Never,
    /// The entry expires this long after it is stored.
    ///
    /// A zero duration means the entry is expired from the moment it is
    /// stored: the deadline is "now" and expiry checks treat a deadline
    /// that has been reached as already elapsed.
    After(Duration),
}

// == Cache Entry ==
/// Represents a single cache entry: a value plus its expiration deadline.
///
/// An entry whose deadline has passed is logically absent even while it is
/// still physically present in the map; every read path must treat it as
/// not found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl<V> CacheEntry<V> {
    /// Creates a new cache entry with an absolute expiration deadline.
    pub fn new(value: V, expires_at: Option<u64>) -> Self {
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is considered expired when the current
    /// time is greater than or equal to the expiration time, so an entry
    /// stored with a zero TTL is expired immediately.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    /// Same check against a caller-supplied clock reading, so a scan over
    /// many entries observes one consistent "now".
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Expiration Time ==
    /// Returns the absolute expiration instant, or None if the entry never
    /// expires.
    pub fn expiration_time(&self) -> Option<SystemTime> {
        self.expires_at
            .map(|ms| UNIX_EPOCH + Duration::from_millis(ms))
    }

    /// Returns remaining TTL in milliseconds, or None if no expiration is
    /// set. Expired entries report zero.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            expires.saturating_sub(now)
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
