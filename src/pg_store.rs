//! PostgreSQL implementation of [`TodoStore`].
//!
//! Expects the schema created by [`init_todo_schema`](crate::init_todo_schema).

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::{NewTodo, Todo, TodoPatch};
use crate::store::TodoStore;

const TODO_COLUMNS: &str = "id, title, completed, owner_id, created_at, updated_at";

/// Todo store backed by a `todos` table
///
/// `todos.owner_id` references `users(id)`. Owners are provisioned outside
/// this crate (by the account service sharing the database); creating a todo
/// for an unknown owner fails with [`StoreError::Failure`].
#[derive(Debug, Clone)]
pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn todo_from_row(row: &PgRow) -> Result<Todo, sqlx::Error> {
    Ok(Todo {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        completed: row.try_get("completed")?,
        owner_id: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn create(&self, todo: NewTodo) -> StoreResult<Todo> {
        let row = sqlx::query(&format!(
            "INSERT INTO todos (id, title, completed, owner_id) VALUES ($1, $2, $3, $4) \
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&todo.title)
        .bind(todo.completed)
        .bind(todo.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(todo_from_row(&row)?)
    }

    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Todo> {
        let row = sqlx::query(&format!(
            "UPDATE todos SET title = COALESCE($2, title), completed = COALESCE($3, completed), \
             updated_at = now() WHERE id = $1 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.completed)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(todo_from_row(&row)?),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Todo> {
        let row = sqlx::query(&format!(
            "DELETE FROM todos WHERE id = $1 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(todo_from_row(&row)?),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn count_and_fetch_page(
        &self,
        owner_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> StoreResult<(Vec<Todo>, u64)> {
        let offset = i64::try_from(offset)
            .map_err(|_| StoreError::Failure(format!("offset {offset} out of range")))?;

        let mut tx = self.pool.begin().await?;
        // Count and slice must come from the same snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM todos WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?
            .try_get("count")?;

        let rows = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE owner_id = $1 \
             ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let items = rows
            .iter()
            .map(todo_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((items, u64::try_from(total).unwrap_or_default()))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
