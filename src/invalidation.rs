//! Mutations with owner-wide listing invalidation.
//!
//! Every successful create, update or delete removes all cached listing pages
//! of the affected owner. Invalidation runs strictly after the store has
//! acknowledged the write and is best-effort: a cache failure leaves pages
//! that expire on their TTL, and the mutation still succeeds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::CacheBackend;
use crate::deadline::{cache_call, store_call};
use crate::error::{CacheResult, StoreError, StoreResult};
use crate::keys::ListKeyScheme;
use crate::model::{NewTodo, Todo, TodoPatch};
use crate::stats::CacheStatistics;
use crate::store::TodoStore;
use crate::traits::{HasOwner, HasPrimaryKey};

/// Removes every cached listing page of an owner.
#[derive(Clone)]
pub struct ListInvalidator {
    cache: Arc<dyn CacheBackend>,
    keys: ListKeyScheme,
    cache_timeout: Duration,
    statistics: Arc<CacheStatistics>,
}

impl ListInvalidator {
    pub fn new(
        cache: Arc<dyn CacheBackend>,
        keys: ListKeyScheme,
        cache_timeout: Duration,
        statistics: Arc<CacheStatistics>,
    ) -> Self {
        Self {
            cache,
            keys,
            cache_timeout,
            statistics,
        }
    }

    /// Enumerates the owner's listing keys, then deletes them in one batch.
    /// Returns the number of keys removed.
    ///
    /// Cost is proportional to the number of distinct pages cached for the
    /// owner, which stays small because keys only exist for pages actually read.
    pub async fn invalidate_owner(&self, owner_id: Uuid) -> CacheResult<usize> {
        let pattern = self.keys.list_key_pattern(owner_id);

        let keys = cache_call(self.cache_timeout, self.cache.keys_matching(&pattern))
            .await
            .inspect_err(|_| self.statistics.record_cache_error())?;
        if keys.is_empty() {
            debug!("No cached listings for owner {}", owner_id);
            return Ok(0);
        }

        let keys: Vec<String> = keys.into_iter().collect();
        cache_call(self.cache_timeout, self.cache.delete_many(&keys))
            .await
            .inspect_err(|_| self.statistics.record_cache_error())?;

        self.statistics.record_invalidated(keys.len());
        debug!("Invalidated {} cached listings for owner {}", keys.len(), owner_id);
        Ok(keys.len())
    }

    /// Like [`invalidate_owner`](Self::invalidate_owner) but only logs failures.
    pub async fn invalidate_owner_best_effort(&self, owner_id: Uuid, cause: &str) {
        if let Err(e) = self.invalidate_owner(owner_id).await {
            warn!(
                "Failed to invalidate cached listings for owner {} after {}; stale until TTL: {}",
                owner_id, cause, e
            );
        }
    }

    pub fn key_scheme(&self) -> &ListKeyScheme {
        &self.keys
    }
}

/// Create, update and delete of todos, each followed by invalidation of the
/// owner's cached listings.
#[derive(Clone)]
pub struct TodoWriteService {
    store: Arc<dyn TodoStore>,
    invalidator: ListInvalidator,
    store_timeout: Duration,
}

impl TodoWriteService {
    pub fn new(store: Arc<dyn TodoStore>, invalidator: ListInvalidator, store_timeout: Duration) -> Self {
        Self {
            store,
            invalidator,
            store_timeout,
        }
    }

    pub async fn create_todo(&self, todo: NewTodo) -> StoreResult<Todo> {
        let owner_id = todo.owner_id();
        match store_call(self.store_timeout, self.store.create(todo)).await {
            Ok(created) => {
                debug!("Created todo {} for owner {}", created.primary_key(), owner_id);
                self.invalidator
                    .invalidate_owner_best_effort(created.owner_id(), "create")
                    .await;
                Ok(created)
            }
            Err(StoreError::Timeout(elapsed)) => {
                // The insert may still commit; drop pages that would hide it.
                self.invalidator
                    .invalidate_owner_best_effort(owner_id, "timed out create")
                    .await;
                Err(StoreError::Timeout(elapsed))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_todo(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Todo> {
        let updated = store_call(self.store_timeout, self.store.update(id, patch)).await?;
        debug!("Updated todo {} of owner {}", id, updated.owner_id());
        self.invalidator
            .invalidate_owner_best_effort(updated.owner_id(), "update")
            .await;
        Ok(updated)
    }

    pub async fn delete_todo(&self, id: Uuid) -> StoreResult<Todo> {
        let deleted = store_call(self.store_timeout, self.store.delete(id)).await?;
        debug!("Deleted todo {} of owner {}", id, deleted.owner_id());
        self.invalidator
            .invalidate_owner_best_effort(deleted.owner_id(), "delete")
            .await;
        Ok(deleted)
    }

    pub fn invalidator(&self) -> &ListInvalidator {
        &self.invalidator
    }
}
