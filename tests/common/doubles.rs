use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use todo_list_cache::{
    CacheBackend, CacheError, CacheResult, MemoryCacheBackend, NewTodo, StoreError, StoreResult,
    Todo, TodoPatch, TodoStore,
};

/// Ordered record of adapter calls shared by the store and cache doubles
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == event)
    }
}

/// Todo store keeping rows in insertion order, with call counters
#[derive(Default)]
pub struct InMemoryTodoStore {
    rows: RwLock<Vec<Todo>>,
    page_fetches: AtomicUsize,
    writes: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    log: Option<EventLog>,
}

#[allow(dead_code)]
impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: EventLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    /// Number of count-and-fetch transactions served
    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    /// Number of successful mutations
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn count_for(&self, owner_id: Uuid) -> usize {
        self.rows.read().iter().filter(|t| t.owner_id == owner_id).count()
    }

    async fn enter(&self, event: &str) -> StoreResult<()> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Failure("connection refused".to_string()));
        }
        if let Some(log) = &self.log {
            log.push(event);
        }
        Ok(())
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn create(&self, todo: NewTodo) -> StoreResult<Todo> {
        self.enter("store:create").await?;
        let now = Utc::now();
        let created = Todo {
            id: Uuid::new_v4(),
            title: todo.title,
            completed: todo.completed,
            owner_id: todo.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().push(created.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Todo> {
        self.enter("store:update").await?;
        let mut rows = self.rows.write();
        let todo = rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        patch.apply_to(todo);
        todo.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(todo.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Todo> {
        self.enter("store:delete").await?;
        let mut rows = self.rows.write();
        let index = rows
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(rows.remove(index))
    }

    async fn count_and_fetch_page(
        &self,
        owner_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Todo>, u64)> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        self.enter("store:fetch_page").await?;
        // One read guard for both count and slice.
        let rows = self.rows.read();
        let owned: Vec<&Todo> = rows.iter().filter(|t| t.owner_id == owner_id).collect();
        let items = owned
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|t| (*t).clone())
            .collect();
        Ok((items, owned.len() as u64))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.enter("store:ping").await
    }
}

/// Memory cache with switchable failures and delays
#[derive(Default)]
pub struct FlakyCache {
    inner: MemoryCacheBackend,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_invalidation: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
    gets: AtomicUsize,
    log: Option<EventLog>,
}

#[allow(dead_code)]
impl FlakyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: EventLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &MemoryCacheBackend {
        &self.inner
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_invalidation(&self, fail: bool) {
        self.fail_invalidation.store(fail, Ordering::SeqCst);
    }

    pub fn set_read_delay(&self, delay: Option<Duration>) {
        *self.read_delay.lock() = delay;
    }

    pub fn set_all_failing(&self, fail: bool) {
        self.set_fail_reads(fail);
        self.set_fail_writes(fail);
        self.set_fail_invalidation(fail);
    }

    fn record(&self, event: &str) {
        if let Some(log) = &self.log {
            log.push(event);
        }
    }

    fn check(flag: &AtomicBool) -> CacheResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for FlakyCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Self::check(&self.fail_reads)?;
        self.record("cache:get");
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        Self::check(&self.fail_writes)?;
        self.record("cache:set");
        self.inner.set(key, value, ttl).await
    }

    async fn keys_matching(&self, pattern: &str) -> CacheResult<HashSet<String>> {
        Self::check(&self.fail_invalidation)?;
        self.record("cache:keys_matching");
        self.inner.keys_matching(pattern).await
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<()> {
        Self::check(&self.fail_invalidation)?;
        self.record("cache:delete_many");
        self.inner.delete_many(keys).await
    }

    async fn ping(&self) -> CacheResult<()> {
        Self::check(&self.fail_reads)?;
        self.inner.ping().await
    }
}
