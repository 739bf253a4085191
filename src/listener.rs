use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::invalidation::ListInvalidator;

/// The default channel name used by the `notify_todo_change()` trigger
pub const DEFAULT_CHANGE_CHANNEL: &str = "todo_changes";

/// Table whose changes invalidate owner listings
pub const TODOS_TABLE: &str = "todos";

/// Kind of row change reported by the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// Notification payload structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoChangeNotification {
    /// The table name that was modified
    pub table: String,
    /// The action performed
    pub action: ChangeAction,
    /// The primary key of the affected row
    pub id: Uuid,
    /// The owner of the affected row
    pub owner_id: Uuid,
}

/// Listener for PostgreSQL notifications about todo rows.
///
/// Writes that bypass [`TodoWriteService`](crate::TodoWriteService), such as
/// migrations or other services sharing the database, still reach the
/// `todos` trigger; this listener turns them into owner invalidations.
pub struct TodoChangeListener {
    invalidator: ListInvalidator,
    channel: String,
}

impl TodoChangeListener {
    /// Create a new listener on the default channel
    pub fn new(invalidator: ListInvalidator) -> Self {
        Self::with_channel(invalidator, DEFAULT_CHANGE_CHANNEL.to_string())
    }

    /// Create a new listener with a custom channel name
    pub fn with_channel(invalidator: ListInvalidator, channel: String) -> Self {
        Self {
            invalidator,
            channel,
        }
    }

    /// Process a single notification payload
    ///
    /// This method can be called from your own notification polling loop.
    /// Malformed payloads and other tables are logged and skipped.
    ///
    /// # Example
    /// ```ignore
    /// while let Some(notification) = get_notification().await {
    ///     listener.process_notification(notification.payload()).await;
    /// }
    /// ```
    pub async fn process_notification(&self, payload: &str) {
        let notification = match serde_json::from_str::<TodoChangeNotification>(payload) {
            Ok(notification) => notification,
            Err(e) => {
                error!("Failed to parse notification payload: {}", e);
                debug!("Payload was: {}", payload);
                return;
            }
        };

        if notification.table != TODOS_TABLE {
            warn!("Ignoring change notification for table '{}'", notification.table);
            return;
        }

        debug!(
            "Handling notification: action={:?}, id={}, owner={}",
            notification.action, notification.id, notification.owner_id
        );
        self.invalidator
            .invalidate_owner_best_effort(notification.owner_id, "change notification")
            .await;
    }

    /// Get the channel name this listener is using
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Starts listening for notifications from PostgreSQL and processes them.
    ///
    /// This method runs until the channel cannot be re-subscribed and is meant
    /// for a background task. Receive errors trigger a reconnect after 5 seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the first connection fails or re-listening on the
    /// channel fails after a reconnect.
    #[cfg(feature = "postgres")]
    pub async fn listen(&self, pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
        let mut listener = sqlx::postgres::PgListener::connect_with(pool).await?;
        listener.listen(&self.channel).await?;
        debug!("Started listening on channel '{}'", self.channel);

        loop {
            match listener.recv().await {
                Ok(notification) => {
                    self.process_notification(notification.payload()).await;
                }
                Err(e) => {
                    error!("Error receiving notification: {}", e);
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;

                    match sqlx::postgres::PgListener::connect_with(pool).await {
                        Ok(new_listener) => {
                            listener = new_listener;
                            if let Err(listen_err) = listener.listen(&self.channel).await {
                                error!(
                                    "Failed to re-listen on channel '{}': {}",
                                    self.channel, listen_err
                                );
                                return Err(listen_err);
                            }
                            // Changes during the gap were missed; their pages expire on TTL.
                            warn!("Reconnected and listening on channel '{}'", self.channel);
                        }
                        Err(connect_err) => {
                            error!("Failed to reconnect to database: {}", connect_err);
                        }
                    }
                }
            }
        }
    }
}
