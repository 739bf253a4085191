use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backend::CacheBackend;
use crate::deadline::{cache_call, store_call};
use crate::store::TodoStore;

/// Overall service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Store and cache both reachable
    Active,
    /// Store reachable, cache not; listings are served from the store
    Degraded,
    /// Store unreachable
    Inactive,
}

/// Reachability of a single dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Connected,
    Disconnected,
}

/// Result of one health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub store: ComponentStatus,
    pub cache: ComponentStatus,
    pub checked_at: DateTime<Utc>,
}

/// Pings the store and the cache backend
#[derive(Clone)]
pub struct HealthCheck {
    store: Arc<dyn TodoStore>,
    cache: Arc<dyn CacheBackend>,
    store_timeout: Duration,
    cache_timeout: Duration,
}

impl HealthCheck {
    pub fn new(
        store: Arc<dyn TodoStore>,
        cache: Arc<dyn CacheBackend>,
        store_timeout: Duration,
        cache_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            store_timeout,
            cache_timeout,
        }
    }

    pub async fn check(&self) -> HealthReport {
        let (store, cache) = tokio::join!(
            store_call(self.store_timeout, self.store.ping()),
            cache_call(self.cache_timeout, self.cache.ping()),
        );

        let store = match store {
            Ok(()) => ComponentStatus::Connected,
            Err(e) => {
                warn!("Health check: store unreachable: {}", e);
                ComponentStatus::Disconnected
            }
        };
        let cache = match cache {
            Ok(()) => ComponentStatus::Connected,
            Err(e) => {
                warn!("Health check: cache unreachable: {}", e);
                ComponentStatus::Disconnected
            }
        };

        let status = match (store, cache) {
            (ComponentStatus::Disconnected, _) => HealthStatus::Inactive,
            (ComponentStatus::Connected, ComponentStatus::Disconnected) => HealthStatus::Degraded,
            (ComponentStatus::Connected, ComponentStatus::Connected) => HealthStatus::Active,
        };

        HealthReport {
            status,
            store,
            cache,
            checked_at: Utc::now(),
        }
    }
}
