//! Database initialization and cleanup for the todo schema
//!
//! Creates the `users` and `todos` tables together with the
//! `notify_todo_change()` trigger that feeds [`TodoChangeListener`](crate::TodoChangeListener).

use sqlx::PgPool;

/// Create the todo tables, indexes and change notification trigger
///
/// The script is idempotent and can run on every start.
///
/// # Example
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use todo_list_cache::init_todo_schema;
///
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// init_todo_schema(pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn init_todo_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    const SQL: &str = include_str!("../sql/todo_schema.sql");
    sqlx::raw_sql(SQL).execute(pool).await?;
    Ok(())
}

/// Drop the todo tables and the notification function
///
/// # Example
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use todo_list_cache::cleanup_todo_schema;
///
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// cleanup_todo_schema(pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn cleanup_todo_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    const SQL: &str = include_str!("../cleanup/cleanup_todo_schema.sql");
    sqlx::raw_sql(SQL).execute(pool).await?;
    Ok(())
}
