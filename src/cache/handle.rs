//! Cache Handle Module
//!
//! The thread-safe cache handle: a clonable wrapper that guards the store
//! behind a reader-writer lock, owns the eviction callback, and manages the
//! background sweeper's lifecycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use crate::cache::entry::{CacheEntry, Ttl};
use crate::cache::stats::{CacheStats, StatCounters};
use crate::cache::store::CacheStore;
use crate::cache::Numeric;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::spawn_sweeper;

/// Callback invoked with the key and value of every entry removed by
/// expiration or explicit delete. Never invoked on overwrite or flush.
pub(crate) type EvictionCallback<V> = Arc<dyn Fn(String, V) + Send + Sync>;

// == Cache Internals ==
/// State shared between all clones of a handle and its sweeper task.
///
/// The sweeper holds only a `Weak` reference to this struct, so the cache
/// is dropped as soon as the last handle goes away; `Drop` then signals the
/// stop channel and the sweeper exits without waiting for its next tick.
pub(crate) struct CacheInner<V> {
    store: RwLock<CacheStore<V>>,
    on_evicted: RwLock<Option<EvictionCallback<V>>>,
    stats: StatCounters,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl<V> CacheInner<V> {
    // == Purge Expired ==
    /// Removes every expired entry and notifies the eviction callback once
    /// per removed entry, after the store lock has been released. Called by
    /// the sweeper on each tick and by `Cache::delete_expired`.
    ///
    /// Callbacks run outside the lock so a callback may re-enter the cache
    /// (e.g. to set a replacement value) without deadlocking.
    pub(crate) fn purge_expired(&self) -> usize {
        let removed = self.store.write().remove_expired();
        let count = removed.len();
        if count > 0 {
            self.stats.record_evictions(count as u64);
            let callback = self.on_evicted.read().clone();
            if let Some(callback) = callback {
                for (key, value) in removed {
                    callback(key, value);
                }
            }
        }
        count
    }
}

impl<V> Drop for CacheInner<V> {
    fn drop(&mut self) {
        // Wakes the sweeper immediately instead of letting it discover the
        // dropped cache on its next tick.
        if let Some(stop_tx) = self.stop_tx.lock().take() {
            let _ = stop_tx.send(());
        }
    }
}

// == Cache Handle ==
/// A thread-safe key-value cache with per-entry TTL expiration.
///
/// Handles are cheap to clone; all clones share the same underlying store.
/// Mutating operations take the exclusive side of the store's lock, pure
/// lookups take the shared side, and no lock is ever held across an
/// eviction callback or snapshot I/O.
///
/// When a sweep interval is configured, construction must happen inside a
/// tokio runtime: the sweeper runs as a background task that periodically
/// purges expired entries. Without one, expired entries are only reported
/// as absent on reads and physically removed by explicit
/// [`delete_expired`](Cache::delete_expired) calls.
pub struct Cache<V> {
    inner: Arc<CacheInner<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Cache<V>
where
    V: Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache with the given default expiration and sweep
    /// interval. A `sweep_interval` of `None` (or zero) disables background
    /// sweeping entirely.
    pub fn new(default_ttl: Ttl, sweep_interval: Option<std::time::Duration>) -> Self {
        Self::with_config(CacheConfig {
            default_ttl,
            sweep_interval,
            ..CacheConfig::default()
        })
    }

    /// Creates a cache from a full configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self::build(
            CacheStore::with_capacity(config.default_ttl, config.initial_capacity),
            &config,
        )
    }

    /// Creates a cache that adopts an existing entry map, e.g. one obtained
    /// from [`items`](Cache::items) or a deserialized snapshot.
    pub fn from_items(items: HashMap<String, CacheEntry<V>>, config: CacheConfig) -> Self {
        Self::build(CacheStore::from_items(config.default_ttl, items), &config)
    }

    fn build(store: CacheStore<V>, config: &CacheConfig) -> Self {
        let inner = Arc::new(CacheInner {
            store: RwLock::new(store),
            on_evicted: RwLock::new(None),
            stats: StatCounters::default(),
            stop_tx: Mutex::new(None),
        });

        if let Some(interval) = config.sweep_interval.filter(|i| !i.is_zero()) {
            let (stop_tx, stop_rx) = oneshot::channel();
            *inner.stop_tx.lock() = Some(stop_tx);
            spawn_sweeper(Arc::downgrade(&inner), interval, stop_rx);
        }

        Self { inner }
    }
}

impl<V> Cache<V> {
    // == Set ==
    /// Stores a value, replacing any existing entry for the key. Overwrite
    /// does not trigger the eviction callback.
    pub fn set(&self, key: String, value: V, ttl: Ttl) {
        self.inner.store.write().set(key, value, ttl);
    }

    /// Stores a value using the cache's configured default expiration.
    pub fn set_default(&self, key: String, value: V) {
        self.set(key, value, Ttl::Default);
    }

    // == Add ==
    /// Inserts only if no live entry exists for the key; fails with
    /// [`AlreadyExists`](crate::CacheError::AlreadyExists) otherwise.
    pub fn add(&self, key: String, value: V, ttl: Ttl) -> Result<()> {
        self.inner.store.write().add(key, value, ttl)
    }

    // == Replace ==
    /// Updates only if a live entry exists for the key; fails with
    /// [`NotFound`](crate::CacheError::NotFound) otherwise.
    pub fn replace(&self, key: String, value: V, ttl: Ttl) -> Result<()> {
        self.inner.store.write().replace(key, value, ttl)
    }

    // == Get ==
    /// Returns the value for a key if a live entry exists.
    ///
    /// Expired entries are reported as absent without being removed; the
    /// sweeper (or an explicit `delete_expired`) handles physical removal.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let found = self.inner.store.read().get(key).cloned();
        match found {
            Some(value) => {
                self.inner.stats.record_hit();
                Some(value)
            }
            None => {
                self.inner.stats.record_miss();
                None
            }
        }
    }

    /// As [`get`](Cache::get), additionally returning the absolute
    /// expiration instant. `None` expiration means the entry never expires.
    pub fn get_with_expiration(&self, key: &str) -> Option<(V, Option<SystemTime>)>
    where
        V: Clone,
    {
        let found = self
            .inner
            .store
            .read()
            .get_entry(key)
            .map(|entry| (entry.value.clone(), entry.expiration_time()));
        match found {
            Some(pair) => {
                self.inner.stats.record_hit();
                Some(pair)
            }
            None => {
                self.inner.stats.record_miss();
                None
            }
        }
    }

    // == Increment / Decrement ==
    /// Adds `delta` to the live value for a key, returning the new value.
    /// Fixed-width integers wrap at their bounds; the entry's expiration is
    /// untouched.
    pub fn increment(&self, key: &str, delta: V) -> Result<V>
    where
        V: Numeric,
    {
        self.inner.store.write().increment(key, delta)
    }

    /// Subtracts `delta` from the live value for a key, returning the new
    /// value.
    pub fn decrement(&self, key: &str, delta: V) -> Result<V>
    where
        V: Numeric,
    {
        self.inner.store.write().decrement(key, delta)
    }

    // == Delete ==
    /// Removes the entry for a key, invoking the eviction callback with the
    /// removed value. No-op if the key is absent.
    pub fn delete(&self, key: &str) {
        let removed = self.inner.store.write().remove(key);
        if let Some(value) = removed {
            self.inner.stats.record_evictions(1);
            let callback = self.inner.on_evicted.read().clone();
            if let Some(callback) = callback {
                callback(key.to_string(), value);
            }
        }
    }

    // == Delete Expired ==
    /// Purges every expired entry now, invoking the eviction callback once
    /// per removed entry. This is what the background sweeper calls on each
    /// tick.
    pub fn delete_expired(&self) {
        self.inner.purge_expired();
    }

    // == Flush ==
    /// Discards all entries without invoking the eviction callback.
    pub fn flush(&self) {
        self.inner.store.write().flush();
    }

    // == Length ==
    /// Returns the number of physically present entries, which may include
    /// expired entries that have not been swept yet.
    pub fn len(&self) -> usize {
        self.inner.store.read().len()
    }

    /// Returns true if no entries are physically present.
    pub fn is_empty(&self) -> bool {
        self.inner.store.read().is_empty()
    }

    // == Items ==
    /// Returns a point-in-time copy of all live entries, suitable for
    /// snapshotting or seeding another cache via
    /// [`from_items`](Cache::from_items).
    pub fn items(&self) -> HashMap<String, CacheEntry<V>>
    where
        V: Clone,
    {
        self.inner.store.read().items()
    }

    // == Stats ==
    /// Returns a snapshot of the cache's performance counters.
    pub fn stats(&self) -> CacheStats {
        let total_entries = self.inner.store.read().len();
        self.inner.stats.snapshot(total_entries)
    }

    // == Eviction Callback ==
    /// Registers a callback invoked with the key and value of every entry
    /// removed by expiration or explicit delete. Overwrites and flushes do
    /// not notify. Replaces any previously registered callback.
    pub fn on_evicted<F>(&self, callback: F)
    where
        F: Fn(String, V) + Send + Sync + 'static,
    {
        self.set_eviction_callback(Some(Arc::new(callback)));
    }

    /// Removes the registered eviction callback, if any.
    pub fn clear_on_evicted(&self) {
        self.set_eviction_callback(None);
    }

    pub(crate) fn set_eviction_callback(&self, callback: Option<EvictionCallback<V>>) {
        *self.inner.on_evicted.write() = callback;
    }

    /// Merges an entry map into the store under a single write lock,
    /// skipping keys that already have a live entry. Returns the number of
    /// entries taken.
    pub(crate) fn merge_items(&self, items: HashMap<String, CacheEntry<V>>) -> usize {
        self.inner.store.write().merge(items)
    }
}
