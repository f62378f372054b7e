//! Cache Store Module
//!
//! The single-threaded map engine: key lookup, TTL resolution, conditional
//! writes, numeric updates, and expiration scans. Thread safety is layered
//! on top by the `Cache` handle, which keeps every call here inside one
//! critical section of its reader-writer lock.

use std::collections::HashMap;

use crate::cache::entry::{current_timestamp_ms, CacheEntry, Ttl};
use crate::cache::Numeric;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Guarded mapping from key to entry with TTL expiration.
///
/// At most one entry exists per key. Entries whose deadline has passed are
/// logically absent: every lookup skips them, and `remove_expired` purges
/// them physically.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Expiration applied when a caller passes `Ttl::Default`.
    /// Normalized at construction: never `Ttl::Default` itself.
    default_ttl: Ttl,
}

impl<V> CacheStore<V> {
    // == Constructors ==
    /// Creates an empty store.
    ///
    /// A `default_ttl` of `Ttl::Default` is normalized to `Ttl::Never`:
    /// with no configured expiration, entries only expire when a duration
    /// is given explicitly.
    pub fn new(default_ttl: Ttl) -> Self {
        Self::with_capacity(default_ttl, 0)
    }

    /// Creates an empty store with pre-allocated capacity.
    pub fn with_capacity(default_ttl: Ttl, capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            default_ttl: normalize_default(default_ttl),
        }
    }

    /// Creates a store that adopts an existing entry map, e.g. one produced
    /// by `items()` on another store or deserialized from a snapshot.
    pub fn from_items(default_ttl: Ttl, items: HashMap<String, CacheEntry<V>>) -> Self {
        Self {
            entries: items,
            default_ttl: normalize_default(default_ttl),
        }
    }

    /// Resolves a per-call TTL against the configured default, returning
    /// the absolute deadline in Unix milliseconds.
    fn deadline(&self, ttl: Ttl) -> Option<u64> {
        let effective = match ttl {
            Ttl::Default => self.default_ttl,
            other => other,
        };
        match effective {
            // default_ttl is normalized, so Default can only reach here
            // through a recursive sentinel; treat it as "never".
            Ttl::Default | Ttl::Never => None,
            Ttl::After(d) => Some(current_timestamp_ms() + d.as_millis() as u64),
        }
    }

    // == Set ==
    /// Stores a value, replacing any existing entry for the key.
    ///
    /// Overwriting is not eviction: the previous value is discarded without
    /// notification.
    pub fn set(&mut self, key: String, value: V, ttl: Ttl) {
        let expires_at = self.deadline(ttl);
        self.entries.insert(key, CacheEntry::new(value, expires_at));
    }

    // == Add ==
    /// Inserts only if no live entry exists for the key.
    ///
    /// The existence check and the insert happen inside this single call,
    /// so one write-lock acquisition covers both.
    pub fn add(&mut self, key: String, value: V, ttl: Ttl) -> Result<()> {
        if self.get(&key).is_some() {
            return Err(CacheError::AlreadyExists(key));
        }
        self.set(key, value, ttl);
        Ok(())
    }

    // == Replace ==
    /// Updates only if a live entry exists for the key.
    pub fn replace(&mut self, key: String, value: V, ttl: Ttl) -> Result<()> {
        if self.get(&key).is_none() {
            return Err(CacheError::NotFound(key));
        }
        self.set(key, value, ttl);
        Ok(())
    }

    // == Get ==
    /// Returns a reference to the live value for a key.
    ///
    /// An expired entry is reported as absent but left in place; physical
    /// removal belongs to `remove_expired`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.get_entry(key).map(|entry| &entry.value)
    }

    /// Returns the live entry for a key, exposing its expiration deadline.
    pub fn get_entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry),
            _ => None,
        }
    }

    // == Increment / Decrement ==
    /// Adds `delta` to the live value for a key, returning the new value.
    ///
    /// The expiration deadline is untouched. Fixed-width integers wrap at
    /// their bounds.
    pub fn increment(&mut self, key: &str, delta: V) -> Result<V>
    where
        V: Numeric,
    {
        self.apply_delta(key, delta, Numeric::add)
    }

    /// Subtracts `delta` from the live value for a key, returning the new
    /// value.
    pub fn decrement(&mut self, key: &str, delta: V) -> Result<V>
    where
        V: Numeric,
    {
        self.apply_delta(key, delta, Numeric::sub)
    }

    fn apply_delta(&mut self, key: &str, delta: V, op: fn(V, V) -> V) -> Result<V>
    where
        V: Numeric,
    {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.value = op(entry.value, delta);
                Ok(entry.value)
            }
            _ => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Remove ==
    /// Removes an entry unconditionally, returning its value if one was
    /// present so the caller can notify an eviction callback.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    // == Remove Expired ==
    /// Purges every expired entry, returning the removed pairs.
    ///
    /// The whole scan observes a single clock reading. Returning the batch
    /// lets the caller run eviction callbacks after releasing its lock,
    /// never while holding it.
    pub fn remove_expired(&mut self) -> Vec<(String, V)> {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        expired_keys
            .into_iter()
            .filter_map(|key| {
                self.entries
                    .remove(&key)
                    .map(|entry| (key, entry.value))
            })
            .collect()
    }

    // == Flush ==
    /// Discards all entries. Bulk clearing is not per-key eviction, so no
    /// values are returned for notification.
    pub fn flush(&mut self) {
        self.entries.clear();
    }

    // == Length ==
    /// Returns the number of physically present entries, which may include
    /// expired entries that have not been swept yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are physically present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Items ==
    /// Returns a point-in-time copy of all live entries.
    pub fn items(&self) -> HashMap<String, CacheEntry<V>>
    where
        V: Clone,
    {
        let now = current_timestamp_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    // == Merge ==
    /// Merges an entry map into the store, skipping any key that already
    /// has a live entry and any incoming entry that is already expired.
    /// Returns the number of entries taken.
    pub fn merge(&mut self, items: HashMap<String, CacheEntry<V>>) -> usize {
        let now = current_timestamp_ms();
        let mut taken = 0;
        for (key, entry) in items {
            if entry.is_expired_at(now) {
                continue;
            }
            if self.get(&key).is_some() {
                continue;
            }
            self.entries.insert(key, entry);
            taken += 1;
        }
        taken
    }
}

/// A configured default of `Ttl::Default` has nothing to refer to; it
/// collapses to "no expiration".
fn normalize_default(default_ttl: Ttl) -> Ttl {
    match default_ttl {
        Ttl::Default => Ttl::Never,
        other => other,
    }
}
