//! Configuration Module
//!
//! Construction parameters for cache handles.

use std::time::Duration;

use crate::cache::Ttl;

/// Cache construction parameters.
///
/// All fields have conservative defaults: no default expiration, no
/// background sweeping, no pre-allocated capacity.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Expiration applied to entries stored with `Ttl::Default`.
    /// A value of `Ttl::Default` here means no default expiration.
    pub default_ttl: Ttl,
    /// Interval between background sweeps of expired entries.
    /// `None` (or a zero duration) disables the sweeper; expired entries
    /// are then only purged by explicit `delete_expired` calls.
    pub sweep_interval: Option<Duration>,
    /// Initial capacity of the entry map.
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Ttl::Never,
            sweep_interval: None,
            initial_capacity: 0,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default expiration.
    pub fn default_ttl(mut self, default_ttl: Ttl) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Sets the background sweep interval.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Sets the initial capacity of the entry map.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}
