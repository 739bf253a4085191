//! Redis implementation of [`CacheBackend`].

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::backend::CacheBackend;
use crate::error::CacheResult;

/// Number of keys requested per SCAN round trip.
const SCAN_BATCH: usize = 100;

/// Cache backend talking to a Redis server through a reconnecting
/// [`ConnectionManager`]. Cloning the manager is cheap and shares the
/// underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisCacheBackend {
    redis: ConnectionManager,
}

impl fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheBackend")
            .field("redis", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCacheBackend {
    /// Connects to the Redis server at `redis_url`.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self { redis })
    }

    /// Wraps an existing connection manager.
    pub fn from_manager(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

/// Redis expiries have one-second resolution here; round up so short TTLs
/// never become "no expiry".
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || secs == 0 {
        secs + 1
    } else {
        secs
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value: Option<String> = self.redis.clone().get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let _: () = self
            .redis
            .clone()
            .set_ex(key, value, ttl_secs(ttl))
            .await?;
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> CacheResult<HashSet<String>> {
        let mut conn = self.redis.clone();
        let mut keys = HashSet::new();
        let mut cursor = 0u64;
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            // SCAN may return a key more than once; the set absorbs duplicates.
            keys.extend(batch);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        debug!("SCAN '{}' matched {} keys", pattern, keys.len());
        Ok(keys)
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let _: () = self.redis.clone().del(keys).await?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let _: String = redis::cmd("PING")
            .query_async(&mut self.redis.clone())
            .await?;
        Ok(())
    }
}
