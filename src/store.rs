use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::model::{NewTodo, Todo, TodoPatch};

/// Durable source of truth for todo records.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Inserts a new todo and returns it with its store-assigned id.
    async fn create(&self, todo: NewTodo) -> StoreResult<Todo>;

    /// Applies `patch` to the todo with `id`.
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) when it does not exist.
    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Todo>;

    /// Deletes the todo with `id` and returns the removed record.
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) when it does not exist.
    async fn delete(&self, id: Uuid) -> StoreResult<Todo>;

    /// Counts all todos of `owner_id` and fetches `limit` of them starting at
    /// `offset`, ordered by creation time then id. Both reads observe one snapshot.
    async fn count_and_fetch_page(
        &self,
        owner_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Todo>, u64)>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
