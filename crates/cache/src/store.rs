//! The cache backend seam.

use std::time::Duration;

use async_trait::async_trait;

/// Errors from the cache layer.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A value could not be (de)serialized.
    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store failed.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// A key-value store with per-entry TTLs.
///
/// Values are opaque strings (the [`CacheHandle`](crate::CacheHandle)
/// owns JSON encoding). Implementations must be safe for concurrent
/// use from many tasks.
#[async_trait]
pub trait ObjectCache: Send + Sync {
    /// Fetch a live (non-expired) value.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value with the given TTL, replacing any previous entry.
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Drop an entry if present.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
