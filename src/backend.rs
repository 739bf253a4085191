use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

/// Key-value cache holding serialized listing pages.
///
/// Values are opaque strings; the services own encoding and decoding.
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the value stored at `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` at `key`, replacing any previous value, expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Returns every live key matching the glob `pattern`.
    async fn keys_matching(&self, pattern: &str) -> CacheResult<HashSet<String>>;

    /// Deletes the given keys. Missing keys are ignored.
    async fn delete_many(&self, keys: &[String]) -> CacheResult<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> CacheResult<()>;
}
