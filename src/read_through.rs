//! Read-through cache for paginated owner listings.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::CacheBackend;
use crate::codec::{decode_page, encode_page};
use crate::config::CacheConfig;
use crate::deadline::{cache_call, store_call};
use crate::error::StoreResult;
use crate::keys::ListKeyScheme;
use crate::model::{PageRequest, PageResult};
use crate::stats::CacheStatistics;
use crate::store::TodoStore;

/// Serves todo listings from the cache, falling back to one store
/// transaction per miss and caching its result for the configured TTL.
///
/// The cache is never required for a correct answer: unreachable, slow or
/// corrupt cache entries degrade to a store read. Concurrent misses on the
/// same key each query the store and the last population wins.
#[derive(Clone)]
pub struct TodoListService {
    store: Arc<dyn TodoStore>,
    cache: Arc<dyn CacheBackend>,
    keys: ListKeyScheme,
    config: CacheConfig,
    statistics: Arc<CacheStatistics>,
}

impl TodoListService {
    pub fn new(
        store: Arc<dyn TodoStore>,
        cache: Arc<dyn CacheBackend>,
        config: CacheConfig,
        statistics: Arc<CacheStatistics>,
    ) -> Self {
        Self {
            store,
            cache,
            keys: ListKeyScheme::new(config.key_prefix.clone()),
            config,
            statistics,
        }
    }

    /// Returns one page of `owner_id`'s todos.
    ///
    /// Only store failures surface as errors; a failed store read leaves the
    /// cache untouched.
    pub async fn list_todos(&self, owner_id: Uuid, request: PageRequest) -> StoreResult<PageResult> {
        let key = self.keys.list_key(owner_id, request);

        if let Some(page) = self.read_cached(&key, owner_id, request).await {
            self.statistics.record_hit();
            debug!("Cache hit for '{}'", key);
            return Ok(page);
        }
        self.statistics.record_miss();
        debug!("Cache miss for '{}'", key);

        self.statistics.record_store_fetch();
        let (items, total_items) = store_call(
            self.config.store_timeout,
            self.store
                .count_and_fetch_page(owner_id, request.offset(), request.page_size()),
        )
        .await?;

        let page = PageResult::new(items, total_items, request);
        self.populate(&key, &page).await;
        Ok(page)
    }

    async fn read_cached(&self, key: &str, owner_id: Uuid, request: PageRequest) -> Option<PageResult> {
        match cache_call(self.config.cache_timeout, self.cache.get(key)).await {
            Ok(Some(payload)) => match decode_page(&payload, owner_id, request) {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!("Ignoring cached page '{}': {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.statistics.record_cache_error();
                warn!("Cache read for '{}' failed, reading from store: {}", key, e);
                None
            }
        }
    }

    async fn populate(&self, key: &str, page: &PageResult) {
        let payload = match encode_page(page) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode page for '{}': {}", key, e);
                return;
            }
        };

        match cache_call(
            self.config.cache_timeout,
            self.cache.set(key, payload, self.config.ttl),
        )
        .await
        {
            Ok(()) => {
                self.statistics.record_population();
                debug!("Cached '{}' for {:?}", key, self.config.ttl);
            }
            Err(e) => {
                self.statistics.record_cache_error();
                warn!("Failed to cache '{}': {}", key, e);
            }
        }
    }

    pub fn key_scheme(&self) -> &ListKeyScheme {
        &self.keys
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
