use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use todo_list_cache::{CacheBackend, CacheConfig, NewTodo, PageRequest, TodoService, TodoStore};

/// Config with short deadlines so timeout tests stay fast
#[allow(dead_code)]
pub fn fast_config() -> CacheConfig {
    CacheConfig::new()
        .with_ttl(Duration::from_secs(60))
        .with_cache_timeout(Duration::from_millis(50))
        .with_store_timeout(Duration::from_millis(200))
}

#[allow(dead_code)]
pub fn page(page: u32, page_size: u32) -> PageRequest {
    PageRequest::new(page, page_size).unwrap()
}

#[allow(dead_code)]
pub fn service_with(store: Arc<dyn TodoStore>, cache: Arc<dyn CacheBackend>) -> TodoService {
    TodoService::new(store, cache, fast_config())
}

/// Inserts `count` todos for `owner_id` directly into the store, bypassing the cache
#[allow(dead_code)]
pub async fn seed_todos(store: &dyn TodoStore, owner_id: Uuid, count: usize) {
    for i in 0..count {
        store
            .create(NewTodo::new(owner_id, format!("todo #{i}")))
            .await
            .unwrap();
    }
}
