//! ttlmap - A lightweight in-memory key-value cache
//!
//! Provides thread-safe caching with per-entry TTL expiration, eviction
//! callbacks, optional sharding for lock contention reduction, and
//! snapshot save/load.
//!
//! ```no_run
//! use std::time::Duration;
//! use ttlmap::{Cache, Ttl};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: Cache<String> =
//!     Cache::new(Ttl::After(Duration::from_secs(300)), Some(Duration::from_secs(1)));
//!
//! cache.set("session".to_string(), "alice".to_string(), Ttl::Default);
//! assert_eq!(cache.get("session"), Some("alice".to_string()));
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{Cache, CacheEntry, CacheStats, CacheStore, Numeric, ShardedCache, Ttl};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
