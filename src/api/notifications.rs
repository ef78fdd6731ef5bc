/// Notification endpoints: pull query and read acknowledgement
use crate::{
    api::middleware,
    context::AppContext,
    db::models::Notification,
    error::WisperResult,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};

/// Build notification routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/:id/read", post(mark_notification_read))
}

/// All of the actor's notifications, newest first
async fn list_notifications(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> WisperResult<Json<Vec<Notification>>> {
    let actor = middleware::require_actor(&headers)?;
    let notifications = ctx.notifications.list(actor).await?;
    Ok(Json(notifications))
}

/// Mark one of the actor's notifications as read; idempotent
async fn mark_notification_read(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> WisperResult<StatusCode> {
    let actor = middleware::require_actor(&headers)?;
    ctx.notifications.mark_read(id, actor).await?;
    Ok(StatusCode::OK)
}
