//! Sharded Cache Module
//!
//! Partitions the key space across a fixed set of independent caches, each
//! with its own lock and sweeper, so write-heavy workloads contend on 1/N
//! of the key space instead of a single lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::cache::entry::{CacheEntry, Ttl};
use crate::cache::handle::Cache;
use crate::cache::stats::CacheStats;
use crate::cache::Numeric;
use crate::config::CacheConfig;
use crate::error::Result;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the key bytes. Deterministic and well-distributed; routing
/// needs stability, not cryptographic strength.
fn fnv1a(key: &str) -> u64 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

// == Sharded Cache ==
/// A cache partitioned into a fixed number of independent shards.
///
/// Every key routes to the same shard for the lifetime of the handle. Each
/// shard has its own lock and its own sweeper, so per-key operations only
/// contend within their shard. Whole-cache operations (`delete_expired`,
/// `flush`, `len`, `items`, snapshotting) visit shards one at a time and
/// are not atomic across them: a concurrent observer may see some shards
/// affected before others.
pub struct ShardedCache<V> {
    shards: Box<[Cache<V>]>,
}

impl<V> Clone for ShardedCache<V> {
    fn clone(&self) -> Self {
        Self {
            shards: self.shards.clone(),
        }
    }
}

impl<V> ShardedCache<V>
where
    V: Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a sharded cache with `shard_count` partitions.
    ///
    /// # Panics
    /// Panics if `shard_count` is zero.
    pub fn new(
        shard_count: usize,
        default_ttl: Ttl,
        sweep_interval: Option<std::time::Duration>,
    ) -> Self {
        Self::with_config(
            shard_count,
            CacheConfig {
                default_ttl,
                sweep_interval,
                ..CacheConfig::default()
            },
        )
    }

    /// Creates a sharded cache where every shard uses the given
    /// configuration.
    ///
    /// # Panics
    /// Panics if `shard_count` is zero.
    pub fn with_config(shard_count: usize, config: CacheConfig) -> Self {
        assert!(shard_count >= 1, "shard_count must be at least 1");
        let shards = (0..shard_count)
            .map(|_| Cache::with_config(config.clone()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards }
    }
}

impl<V> ShardedCache<V> {
    /// Number of shards the key space is partitioned into.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_index(&self, key: &str) -> usize {
        (fnv1a(key) % self.shards.len() as u64) as usize
    }

    fn shard(&self, key: &str) -> &Cache<V> {
        &self.shards[self.shard_index(key)]
    }

    // == Per-Key Operations ==
    /// Stores a value in the key's shard, replacing any existing entry.
    pub fn set(&self, key: String, value: V, ttl: Ttl) {
        self.shard(&key).set(key, value, ttl);
    }

    /// Stores a value using the configured default expiration.
    pub fn set_default(&self, key: String, value: V) {
        self.set(key, value, Ttl::Default);
    }

    /// Inserts only if no live entry exists for the key.
    pub fn add(&self, key: String, value: V, ttl: Ttl) -> Result<()> {
        self.shard(&key).add(key, value, ttl)
    }

    /// Updates only if a live entry exists for the key.
    pub fn replace(&self, key: String, value: V, ttl: Ttl) -> Result<()> {
        self.shard(&key).replace(key, value, ttl)
    }

    /// Returns the value for a key if a live entry exists.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.shard(key).get(key)
    }

    /// As `get`, additionally returning the absolute expiration instant.
    pub fn get_with_expiration(&self, key: &str) -> Option<(V, Option<SystemTime>)>
    where
        V: Clone,
    {
        self.shard(key).get_with_expiration(key)
    }

    /// Adds `delta` to the live value for a key, returning the new value.
    pub fn increment(&self, key: &str, delta: V) -> Result<V>
    where
        V: Numeric,
    {
        self.shard(key).increment(key, delta)
    }

    /// Subtracts `delta` from the live value for a key, returning the new
    /// value.
    pub fn decrement(&self, key: &str, delta: V) -> Result<V>
    where
        V: Numeric,
    {
        self.shard(key).decrement(key, delta)
    }

    /// Removes the entry for a key, invoking the eviction callback with the
    /// removed value.
    pub fn delete(&self, key: &str) {
        self.shard(key).delete(key);
    }

    // == Whole-Cache Operations ==
    /// Purges expired entries from every shard.
    pub fn delete_expired(&self) {
        for shard in self.shards.iter() {
            shard.delete_expired();
        }
    }

    /// Discards all entries in every shard. A concurrent reader may observe
    /// some shards cleared before others.
    pub fn flush(&self) {
        for shard in self.shards.iter() {
            shard.flush();
        }
    }

    /// Total number of physically present entries across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Cache::len).sum()
    }

    /// Returns true if every shard is empty.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Cache::is_empty)
    }

    /// A point-in-time copy of all live entries across all shards. Each
    /// shard is copied under its own lock; the union is not a single atomic
    /// observation.
    pub fn items(&self) -> HashMap<String, CacheEntry<V>>
    where
        V: Clone,
    {
        let mut all = HashMap::new();
        for shard in self.shards.iter() {
            all.extend(shard.items());
        }
        all
    }

    /// Aggregated performance counters across all shards.
    pub fn stats(&self) -> CacheStats {
        let mut total = CacheStats::default();
        for shard in self.shards.iter() {
            total.absorb(&shard.stats());
        }
        total
    }

    /// Registers an eviction callback on every shard.
    pub fn on_evicted<F>(&self, callback: F)
    where
        F: Fn(String, V) + Send + Sync + 'static,
    {
        let callback: Arc<dyn Fn(String, V) + Send + Sync> = Arc::new(callback);
        for shard in self.shards.iter() {
            shard.set_eviction_callback(Some(callback.clone()));
        }
    }

    /// Removes the eviction callback from every shard.
    pub fn clear_on_evicted(&self) {
        for shard in self.shards.iter() {
            shard.set_eviction_callback(None);
        }
    }

    /// Routes a deserialized entry map to the owning shards and merges each
    /// partition under that shard's lock.
    pub(crate) fn merge_items(&self, items: HashMap<String, CacheEntry<V>>) -> usize {
        let mut partitions: Vec<HashMap<String, CacheEntry<V>>> =
            (0..self.shards.len()).map(|_| HashMap::new()).collect();
        for (key, entry) in items {
            let index = self.shard_index(&key);
            partitions[index].insert(key, entry);
        }

        partitions
            .into_iter()
            .zip(self.shards.iter())
            .map(|(partition, shard)| shard.merge_items(partition))
            .sum()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_vectors() {
        // published FNV-1a test vectors
        assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a("foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_routing_is_stable() {
        let cache: ShardedCache<i64> = ShardedCache::new(13, Ttl::Never, None);

        for key in ["f", "fo", "foo", "barf", "bazbarfoo", "foobarbazquux"] {
            let first = cache.shard_index(key);
            for _ in 0..10 {
                assert_eq!(cache.shard_index(key), first);
            }
        }
    }

    #[test]
    fn test_routing_spreads_keys() {
        let cache: ShardedCache<i64> = ShardedCache::new(8, Ttl::Never, None);

        let mut hit_shards = std::collections::HashSet::new();
        for i in 0..200 {
            hit_shards.insert(cache.shard_index(&format!("key-{i}")));
        }
        // 200 keys over 8 shards must touch more than one shard
        assert!(hit_shards.len() > 1);
    }

    #[test]
    fn test_sharded_set_get_delete() {
        let cache: ShardedCache<String> = ShardedCache::new(4, Ttl::Never, None);

        cache.set("key1".to_string(), "value1".to_string(), Ttl::Default);
        assert_eq!(cache.get("key1"), Some("value1".to_string()));

        cache.delete("key1");
        assert_eq!(cache.get("key1"), None);
    }

    #[test]
    fn test_sharded_len_sums_shards() {
        let cache: ShardedCache<i64> = ShardedCache::new(8, Ttl::Never, None);

        for i in 0..100 {
            cache.set(format!("key-{i}"), i, Ttl::Default);
        }
        assert_eq!(cache.len(), 100);

        cache.flush();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sharded_add_replace_route_to_same_shard() {
        let cache: ShardedCache<i64> = ShardedCache::new(8, Ttl::Never, None);

        cache.add("n".to_string(), 1, Ttl::Default).unwrap();
        assert!(cache.add("n".to_string(), 2, Ttl::Default).is_err());
        cache.replace("n".to_string(), 3, Ttl::Default).unwrap();
        assert_eq!(cache.get("n"), Some(3));
    }

    #[test]
    fn test_sharded_increment() {
        let cache: ShardedCache<u64> = ShardedCache::new(4, Ttl::Never, None);

        cache.set("n".to_string(), 10, Ttl::Default);
        assert_eq!(cache.increment("n", 5).unwrap(), 15);
        assert_eq!(cache.decrement("n", 1).unwrap(), 14);
    }

    #[test]
    fn test_sharded_items_union() {
        let cache: ShardedCache<i64> = ShardedCache::new(4, Ttl::Never, None);

        for i in 0..20 {
            cache.set(format!("key-{i}"), i, Ttl::Default);
        }
        let items = cache.items();
        assert_eq!(items.len(), 20);
        assert_eq!(items["key-7"].value, 7);
    }

    #[test]
    #[should_panic(expected = "shard_count must be at least 1")]
    fn test_zero_shards_rejected() {
        let _: ShardedCache<i64> = ShardedCache::new(0, Ttl::Never, None);
    }
}
