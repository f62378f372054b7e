//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// All failures are returned as values; the library never panics on a
/// recoverable condition.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `add` was called on a key that already holds a live entry
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// `replace`, `increment` or `decrement` was called on a key with no
    /// live entry (absent or expired)
    #[error("key not found: {0}")]
    NotFound(String),

    /// A stored value could not be encoded while writing a snapshot
    #[error("snapshot serialization failed: {0}")]
    Serialization(serde_json::Error),

    /// A snapshot byte stream was malformed or truncated
    #[error("snapshot deserialization failed: {0}")]
    Deserialization(serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
