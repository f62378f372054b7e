//! Snapshot Codec Module
//!
//! Serializes a cache's live entries to a byte stream and merges a
//! previously saved stream back in. Snapshots are a best-effort
//! convenience, not a durability mechanism: entries already expired at
//! save time are excluded, and loading never overwrites live data.
//!
//! The wire format is a self-describing JSON object mapping each key to
//! its entry (`value` plus optional `expires_at` in Unix milliseconds;
//! an absent deadline round-trips the never-expires marker exactly).

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::entry::CacheEntry;
use crate::cache::handle::Cache;
use crate::cache::sharded::ShardedCache;
use crate::error::{CacheError, Result};

impl<V> Cache<V>
where
    V: Clone + Serialize,
{
    // == Save ==
    /// Writes the cache's live entries to `writer`.
    ///
    /// The entry map is copied under the read lock and serialized after the
    /// lock is released, so snapshot I/O never blocks cache operations. On
    /// failure the in-memory state is unaffected.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let items = self.items();
        let count = items.len();
        serde_json::to_writer(writer, &items).map_err(CacheError::Serialization)?;
        debug!("snapshot saved {} entries", count);
        Ok(())
    }
}

impl<V> Cache<V>
where
    V: DeserializeOwned,
{
    // == Load ==
    /// Merges a previously saved snapshot from `reader` into the cache.
    ///
    /// The stream is fully deserialized before the store is touched, so
    /// malformed input leaves the cache unchanged. Keys that already hold a
    /// live entry keep their current value; records whose deadline has
    /// already passed are dropped.
    pub fn load<R: Read>(&self, reader: R) -> Result<()> {
        let items: HashMap<String, CacheEntry<V>> =
            serde_json::from_reader(reader).map_err(CacheError::Deserialization)?;
        let taken = self.merge_items(items);
        debug!("snapshot load merged {} entries", taken);
        Ok(())
    }
}

impl<V> ShardedCache<V>
where
    V: Clone + Serialize,
{
    /// Writes the live entries of every shard to `writer` as one record
    /// stream. Shards are copied one at a time under their own locks.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let items = self.items();
        let count = items.len();
        serde_json::to_writer(writer, &items).map_err(CacheError::Serialization)?;
        debug!("snapshot saved {} entries across shards", count);
        Ok(())
    }
}

impl<V> ShardedCache<V>
where
    V: DeserializeOwned,
{
    /// Merges a previously saved snapshot into the sharded cache, routing
    /// each record to its owning shard. Per-shard merge semantics match
    /// [`Cache::load`]; there is no cross-shard atomicity.
    pub fn load<R: Read>(&self, reader: R) -> Result<()> {
        let items: HashMap<String, CacheEntry<V>> =
            serde_json::from_reader(reader).map_err(CacheError::Deserialization)?;
        let taken = self.merge_items(items);
        debug!("snapshot load merged {} entries across shards", taken);
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::Ttl;
    use std::time::Duration;

    #[test]
    fn test_snapshot_roundtrip() {
        let source: Cache<i64> = Cache::new(Ttl::Never, None);
        source.set("a".to_string(), 1, Ttl::Never);
        source.set("b".to_string(), 2, Ttl::After(Duration::from_secs(60)));

        let mut buffer = Vec::new();
        source.save(&mut buffer).unwrap();

        let dest: Cache<i64> = Cache::new(Ttl::Never, None);
        dest.load(buffer.as_slice()).unwrap();

        assert_eq!(dest.get("a"), Some(1));
        assert_eq!(dest.get("b"), Some(2));
        // the never-expires marker survives the round trip
        let (_, expiration) = dest.get_with_expiration("a").unwrap();
        assert!(expiration.is_none());
        let (_, expiration) = dest.get_with_expiration("b").unwrap();
        assert!(expiration.is_some());
    }

    #[test]
    fn test_snapshot_excludes_expired_at_save() {
        let source: Cache<i64> = Cache::new(Ttl::Never, None);
        source.set("gone".to_string(), 1, Ttl::After(Duration::from_millis(20)));
        source.set("kept".to_string(), 2, Ttl::Never);
        std::thread::sleep(Duration::from_millis(40));

        let mut buffer = Vec::new();
        source.save(&mut buffer).unwrap();

        let dest: Cache<i64> = Cache::new(Ttl::Never, None);
        dest.load(buffer.as_slice()).unwrap();

        assert_eq!(dest.len(), 1);
        assert_eq!(dest.get("gone"), None);
    }

    #[test]
    fn test_load_does_not_overwrite_live_entries() {
        let source: Cache<String> = Cache::new(Ttl::Never, None);
        source.set("k".to_string(), "persisted".to_string(), Ttl::Never);

        let mut buffer = Vec::new();
        source.save(&mut buffer).unwrap();

        let dest: Cache<String> = Cache::new(Ttl::Never, None);
        dest.set("k".to_string(), "current".to_string(), Ttl::Never);
        dest.load(buffer.as_slice()).unwrap();

        assert_eq!(dest.get("k"), Some("current".to_string()));
    }

    #[test]
    fn test_load_malformed_input_leaves_cache_unchanged() {
        let dest: Cache<i64> = Cache::new(Ttl::Never, None);
        dest.set("k".to_string(), 1, Ttl::Never);

        let result = dest.load(&b"{ not json"[..]);
        assert!(matches!(result, Err(CacheError::Deserialization(_))));
        assert_eq!(dest.len(), 1);
        assert_eq!(dest.get("k"), Some(1));
    }

    #[test]
    fn test_sharded_snapshot_roundtrip() {
        let source: ShardedCache<i64> = ShardedCache::new(4, Ttl::Never, None);
        for i in 0..20 {
            source.set(format!("key-{i}"), i, Ttl::Never);
        }

        let mut buffer = Vec::new();
        source.save(&mut buffer).unwrap();

        let dest: ShardedCache<i64> = ShardedCache::new(4, Ttl::Never, None);
        dest.load(buffer.as_slice()).unwrap();

        assert_eq!(dest.len(), 20);
        for i in 0..20 {
            assert_eq!(dest.get(&format!("key-{i}")), Some(i));
        }
    }

    #[test]
    fn test_snapshot_loads_across_shard_counts() {
        let source: ShardedCache<i64> = ShardedCache::new(8, Ttl::Never, None);
        for i in 0..20 {
            source.set(format!("key-{i}"), i, Ttl::Never);
        }

        let mut buffer = Vec::new();
        source.save(&mut buffer).unwrap();

        // records re-route against the destination's own shard count
        let dest: ShardedCache<i64> = ShardedCache::new(3, Ttl::Never, None);
        dest.load(buffer.as_slice()).unwrap();
        assert_eq!(dest.len(), 20);
    }
}
