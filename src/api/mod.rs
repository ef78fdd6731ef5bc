/// API routes and handlers
pub mod middleware;
pub mod notifications;
pub mod users;
pub mod wispers;
pub mod ws;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(users::routes())
        .merge(wispers::routes())
        .merge(notifications::routes())
        .merge(ws::routes())
}
