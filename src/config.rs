use std::time::Duration;

use crate::error::ConfigError;
use crate::keys::DEFAULT_KEY_PREFIX;

/// Default lifetime of a cached listing page.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
/// Default deadline for a single cache operation.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(500);
/// Default deadline for a single store operation.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the listing cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of a cached page; the upper bound on staleness after a missed invalidation
    pub ttl: Duration,
    /// Deadline for each cache call; an expired read counts as a miss
    pub cache_timeout: Duration,
    /// Deadline for each store call; an expired call fails the request
    pub store_timeout: Duration,
    /// Namespace for all keys written by this service
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL for cached pages
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the deadline for cache calls
    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// Set the deadline for store calls
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Set the key namespace
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Connection settings plus cache tuning, usually read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub database_url: String,
    /// When absent the service runs with the in-process cache backend.
    pub redis_url: Option<String>,
    pub cache: CacheConfig,
}

impl ServiceConfig {
    /// Reads `DATABASE_URL`, `REDIS_URL`, `TODO_CACHE_TTL_SECS`,
    /// `TODO_CACHE_TIMEOUT_MS`, `TODO_STORE_TIMEOUT_MS` and `TODO_CACHE_KEY_PREFIX`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());

        let mut cache = CacheConfig::default();
        if let Some(secs) = parse_u64(&lookup, "TODO_CACHE_TTL_SECS")? {
            cache.ttl = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_u64(&lookup, "TODO_CACHE_TIMEOUT_MS")? {
            cache.cache_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, "TODO_STORE_TIMEOUT_MS")? {
            cache.store_timeout = Duration::from_millis(ms);
        }
        if let Some(prefix) = lookup("TODO_CACHE_KEY_PREFIX") {
            if prefix.is_empty() {
                return Err(ConfigError::Invalid {
                    name: "TODO_CACHE_KEY_PREFIX",
                    value: prefix,
                });
            }
            cache.key_prefix = prefix;
        }

        Ok(Self {
            database_url,
            redis_url,
            cache,
        })
    }
}

fn parse_u64<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::Invalid { name, value }),
            Ok(parsed) => Ok(Some(parsed)),
        },
    }
}
