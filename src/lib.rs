//! # Todo List Cache
//!
//! This crate keeps a paginated, per-owner cache of todo listings consistent
//! with a PostgreSQL source of truth. Reads go through the cache and populate
//! it on miss; every successful mutation invalidates all cached pages of the
//! affected owner. A fallback TTL bounds staleness when an invalidation is lost.
//!
//! ## Key Components
//!
//! - `TodoService`: Facade wiring the read and write paths to one store and one cache
//! - `TodoListService`: Read-through listing with store fallback and population
//! - `TodoWriteService` / `ListInvalidator`: Mutations followed by owner-wide invalidation
//! - `ListKeyScheme`: Owner-partitioned cache keys and invalidation patterns
//! - `TodoStore` and `CacheBackend`: Adapter traits, with Postgres, Redis and in-process implementations
//! - `StagedInvalidation`: Commit-time invalidation for a `TransactionAware` unit of work
//! - `TodoChangeListener`: Invalidation driven by Postgres notifications

mod backend;
mod codec;
mod config;
mod deadline;
mod error;
mod health;
mod invalidation;
mod keys;
mod listener;
mod memory_backend;
mod model;
mod read_through;
mod service;
mod staged;
mod stats;
mod store;
mod traits;

#[cfg(feature = "postgres")]
mod db_init;
#[cfg(feature = "postgres")]
mod pg_store;
#[cfg(feature = "redis-cache")]
mod redis_backend;

pub use backend::CacheBackend;
pub use codec::{decode_page, encode_page, PAYLOAD_VERSION};
pub use config::{
    CacheConfig, ServiceConfig, DEFAULT_CACHE_TIMEOUT, DEFAULT_STORE_TIMEOUT, DEFAULT_TTL,
};
pub use error::{
    CacheError, CacheResult, ConfigError, InitError, PageRequestError, StoreError, StoreResult,
};
pub use health::{ComponentStatus, HealthCheck, HealthReport, HealthStatus};
pub use invalidation::{ListInvalidator, TodoWriteService};
pub use keys::{escape_glob, glob_match, ListKeyScheme, DEFAULT_KEY_PREFIX};
pub use listener::{
    ChangeAction, TodoChangeListener, TodoChangeNotification, DEFAULT_CHANGE_CHANNEL, TODOS_TABLE,
};
pub use memory_backend::{MemoryCacheBackend, DEFAULT_CAPACITY};
pub use model::{
    NewTodo, PageRequest, PageResult, Todo, TodoPatch, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use read_through::TodoListService;
pub use service::TodoService;
pub use staged::StagedInvalidation;
pub use stats::CacheStatistics;
pub use store::TodoStore;
pub use traits::{HasOwner, HasPrimaryKey};

#[cfg(feature = "postgres")]
pub use db_init::{cleanup_todo_schema, init_todo_schema};
#[cfg(feature = "postgres")]
pub use pg_store::PgTodoStore;
#[cfg(feature = "redis-cache")]
pub use redis_backend::RedisCacheBackend;

// Re-export TransactionAware from postgres-unit-of-work for convenience
pub use postgres_unit_of_work::TransactionAware;
