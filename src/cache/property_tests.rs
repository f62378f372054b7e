//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify cache behavior against a plain map model.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::{Cache, Ttl};

// == Strategies ==
/// Generates cache keys drawn from a small alphabet so operations collide
/// often enough to exercise overwrite and delete paths.
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,4}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: i64 },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of set/get/delete operations with no expirations,
    // the cache agrees with a plain HashMap at every step.
    #[test]
    fn prop_model_consistency(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache: Cache<i64> = Cache::new(Ttl::Never, None);
        let mut model: HashMap<String, i64> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), value, Ttl::Default);
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(cache.get(&key), model.get(&key).copied());
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                    model.remove(&key);
                }
            }
        }

        prop_assert_eq!(cache.len(), model.len());
    }

    // For any sequence of reads, hit and miss counters match what a model
    // map would have produced.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let cache: Cache<i64> = Cache::new(Ttl::Never, None);
        let mut model: HashMap<String, i64> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), value, Ttl::Default);
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    if cache.get(&key).is_some() {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                    model.remove(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, model.len(), "Total entries mismatch");
    }

    // For any key-value pair, storing then retrieving returns the stored
    // value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let cache: Cache<i64> = Cache::new(Ttl::Never, None);

        cache.set(key.clone(), value, Ttl::Default);
        prop_assert_eq!(cache.get(&key), Some(value));
    }

    // Add fails exactly when a live entry exists; replace succeeds exactly
    // when one does.
    #[test]
    fn prop_add_replace_exclusion(key in key_strategy(), v1 in value_strategy(), v2 in value_strategy()) {
        let cache: Cache<i64> = Cache::new(Ttl::Never, None);

        // fresh key: replace fails, add succeeds
        prop_assert!(cache.replace(key.clone(), v1, Ttl::Default).is_err());
        prop_assert!(cache.add(key.clone(), v1, Ttl::Default).is_ok());

        // live key: add fails, replace succeeds
        prop_assert!(cache.add(key.clone(), v2, Ttl::Default).is_err());
        prop_assert_eq!(cache.get(&key), Some(v1));
        prop_assert!(cache.replace(key.clone(), v2, Ttl::Default).is_ok());
        prop_assert_eq!(cache.get(&key), Some(v2));
    }

    // Increment follows wrapping arithmetic for any starting value and any
    // sequence of deltas.
    #[test]
    fn prop_increment_wrapping(start in any::<i8>(), deltas in prop::collection::vec(any::<i8>(), 1..20)) {
        let cache: Cache<i8> = Cache::new(Ttl::Never, None);
        cache.set("n".to_string(), start, Ttl::Default);

        let mut expected = start;
        for delta in deltas {
            expected = expected.wrapping_add(delta);
            prop_assert_eq!(cache.increment("n", delta).unwrap(), expected);
        }
        prop_assert_eq!(cache.get("n"), Some(expected));
    }

    // Decrement is the exact inverse of increment.
    #[test]
    fn prop_decrement_inverts_increment(start in any::<u32>(), delta in any::<u32>()) {
        let cache: Cache<u32> = Cache::new(Ttl::Never, None);
        cache.set("n".to_string(), start, Ttl::Default);

        cache.increment("n", delta).unwrap();
        prop_assert_eq!(cache.decrement("n", delta).unwrap(), start);
    }
}
