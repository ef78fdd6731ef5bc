/// Notification log: durable, per-user ordered record of interaction events
///
/// Entries are append-only with a read/unread flag that flips false->true
/// exactly once, triggered only by the recipient. The log write always
/// precedes any push attempt, so a missed push never loses the record.
use crate::{
    db::models::{Notification, NotificationKind},
    error::{WisperError, WisperResult},
};
use chrono::Utc;
use sqlx::SqlitePool;

/// How much of the wisper body is quoted in a notification message
const SNIPPET_CHARS: usize = 50;

/// Notification log service
#[derive(Clone)]
pub struct NotificationLog {
    db: SqlitePool,
}

impl NotificationLog {
    /// Create a new notification log
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append a notification for a recipient
    ///
    /// Callers suppress self-notifications before invoking this; the log
    /// records whatever it is given.
    pub async fn emit(
        &self,
        user_id: i64,
        kind: NotificationKind,
        content: &str,
        wisper_id: Option<i64>,
    ) -> WisperResult<Notification> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO notifications (user_id, kind, content, wisper_id, read, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5) RETURNING id",
        )
        .bind(user_id)
        .bind(kind)
        .bind(content)
        .bind(wisper_id)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(WisperError::Database)?;

        Ok(Notification {
            id,
            user_id,
            kind,
            content: content.to_string(),
            wisper_id,
            read: false,
            created_at: now,
        })
    }

    /// Mark a notification as read; recipient only, idempotent
    pub async fn mark_read(&self, id: i64, user_id: i64) -> WisperResult<()> {
        let result =
            sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2")
                .bind(id)
                .bind(user_id)
                .execute(&self.db)
                .await
                .map_err(WisperError::Database)?;

        if result.rows_affected() == 0 {
            return Err(WisperError::NotFound(format!(
                "Notification {} not found",
                id
            )));
        }

        Ok(())
    }

    /// All notifications for a user, newest first, read and unread intermixed
    pub async fn list(&self, user_id: i64) -> WisperResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(WisperError::Database)?;

        Ok(notifications)
    }
}

/// Message for a like event, quoting a snippet of the wisper body
pub fn like_message(content: &str) -> String {
    format!("Someone liked your wisper: \"{}...\"", snippet(content))
}

/// Message for a comment event, quoting a snippet of the wisper body
pub fn comment_message(content: &str) -> String {
    format!(
        "Someone commented on your wisper: \"{}...\"",
        snippet(content)
    )
}

/// Character-boundary-safe truncation of the wisper body
fn snippet(content: &str) -> String {
    content.chars().take(SNIPPET_CHARS).collect()
}
