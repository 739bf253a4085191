use std::time::Duration;

use uuid::Uuid;

/// Error type for store operations.
///
/// These always surface to the caller of the list and write services.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store operation failed: {0}")]
    Failure(String),

    #[error("Todo not found: {0}")]
    NotFound(Uuid),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Failure(err.to_string())
    }
}

/// Error type for cache backend operations.
///
/// Services never propagate these; a failing cache degrades to a miss on
/// reads and to a stale-until-TTL window on invalidation.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed cached payload: {0}")]
    MalformedPayload(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(feature = "redis-cache")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::MalformedPayload(err.to_string())
    }
}

/// Rejected pagination parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    #[error("Page number must be at least 1, got {0}")]
    InvalidPage(u32),

    #[error("Page size must be between 1 and {max}, got {got}")]
    InvalidPageSize { got: u32, max: u32 },
}

/// Error type for loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Error type for wiring a service from configuration
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to connect to store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to connect to cache: {0}")]
    Cache(#[from] CacheError),

    #[error("REDIS_URL is set but the redis-cache feature is disabled")]
    RedisDisabled,
}
