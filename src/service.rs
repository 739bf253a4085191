use std::sync::Arc;

use uuid::Uuid;

use crate::backend::CacheBackend;
use crate::config::CacheConfig;
use crate::error::StoreResult;
use crate::health::{HealthCheck, HealthReport};
use crate::invalidation::{ListInvalidator, TodoWriteService};
use crate::keys::ListKeyScheme;
use crate::listener::TodoChangeListener;
use crate::model::{NewTodo, PageRequest, PageResult, Todo, TodoPatch};
use crate::read_through::TodoListService;
use crate::stats::CacheStatistics;
use crate::staged::StagedInvalidation;
use crate::store::TodoStore;

/// Todo listing and mutation entry point.
///
/// Owns one store and one cache backend, both injected, and shares a single
/// key scheme and statistics between the read and write paths.
#[derive(Clone)]
pub struct TodoService {
    list: TodoListService,
    write: TodoWriteService,
    health: HealthCheck,
    statistics: Arc<CacheStatistics>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>, cache: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        let statistics = Arc::new(CacheStatistics::new());
        let invalidator = ListInvalidator::new(
            cache.clone(),
            ListKeyScheme::new(config.key_prefix.clone()),
            config.cache_timeout,
            statistics.clone(),
        );
        let health = HealthCheck::new(
            store.clone(),
            cache.clone(),
            config.store_timeout,
            config.cache_timeout,
        );
        let write = TodoWriteService::new(store.clone(), invalidator, config.store_timeout);
        let list = TodoListService::new(store, cache, config, statistics.clone());

        Self {
            list,
            write,
            health,
            statistics,
        }
    }

    /// Connects to Postgres and, when `redis_url` is set, to Redis. Without a
    /// Redis URL the in-process backend is used.
    #[cfg(feature = "postgres")]
    pub async fn connect(config: &crate::config::ServiceConfig) -> Result<Self, crate::error::InitError> {
        let store = crate::pg_store::PgTodoStore::connect(&config.database_url).await?;
        let cache: Arc<dyn CacheBackend> = match &config.redis_url {
            #[cfg(feature = "redis-cache")]
            Some(url) => Arc::new(crate::redis_backend::RedisCacheBackend::connect(url).await?),
            #[cfg(not(feature = "redis-cache"))]
            Some(_) => return Err(crate::error::InitError::RedisDisabled),
            None => Arc::new(crate::memory_backend::MemoryCacheBackend::new()),
        };
        Ok(Self::new(Arc::new(store), cache, config.cache.clone()))
    }

    pub async fn list_todos(&self, owner_id: Uuid, request: PageRequest) -> StoreResult<PageResult> {
        self.list.list_todos(owner_id, request).await
    }

    pub async fn create_todo(&self, todo: NewTodo) -> StoreResult<Todo> {
        self.write.create_todo(todo).await
    }

    pub async fn update_todo(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Todo> {
        self.write.update_todo(id, patch).await
    }

    pub async fn delete_todo(&self, id: Uuid) -> StoreResult<Todo> {
        self.write.delete_todo(id).await
    }

    pub async fn health(&self) -> HealthReport {
        self.health.check().await
    }

    pub fn statistics(&self) -> &CacheStatistics {
        &self.statistics
    }

    pub fn invalidator(&self) -> &ListInvalidator {
        self.write.invalidator()
    }

    /// A fresh participant for an external unit of work
    pub fn staged_invalidation(&self) -> StagedInvalidation {
        StagedInvalidation::new(self.invalidator().clone())
    }

    /// A listener invalidating listings on `todo_changes` notifications
    pub fn change_listener(&self) -> TodoChangeListener {
        TodoChangeListener::new(self.invalidator().clone())
    }

    pub fn key_scheme(&self) -> &ListKeyScheme {
        self.list.key_scheme()
    }
}
