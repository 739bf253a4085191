//! Deadlines for cache and store calls.

use std::future::Future;
use std::time::Duration;

use crate::error::{CacheError, CacheResult, StoreError, StoreResult};

/// Runs a cache call, turning an elapsed deadline into [`CacheError::Timeout`].
pub(crate) async fn cache_call<T, F>(timeout: Duration, call: F) -> CacheResult<T>
where
    F: Future<Output = CacheResult<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(CacheError::Timeout(timeout)))
}

/// Runs a store call, turning an elapsed deadline into [`StoreError::Timeout`].
pub(crate) async fn store_call<T, F>(timeout: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(StoreError::Timeout(timeout)))
}
