/// Background task implementations
use crate::{context::AppContext, db, error::WisperResult};
use chrono::{Duration, Utc};

/// Read notifications older than this are eligible for pruning
const RETENTION_DAYS: i64 = 30;

/// Delete read notifications past the retention window
///
/// Unread notifications are kept indefinitely; the recipient has not seen
/// them yet.
pub async fn prune_read_notifications(ctx: &AppContext) -> WisperResult<u64> {
    let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);

    let result = sqlx::query("DELETE FROM notifications WHERE read = 1 AND created_at < ?1")
        .bind(cutoff)
        .execute(&ctx.db)
        .await?;

    Ok(result.rows_affected())
}

/// Verify the ledger database is reachable
pub async fn health_check(ctx: &AppContext) -> WisperResult<()> {
    db::test_connection(&ctx.db).await
}
