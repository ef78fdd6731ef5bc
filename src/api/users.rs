/// User provisioning endpoints
///
/// The session layer fronting this service owns credentials; it calls
/// these endpoints when it registers an account so the ledger has an
/// identity row to reference.
use crate::{
    context::AppContext,
    db::models::User,
    error::{WisperError, WisperResult},
    validation,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/:id", get(get_user))
}

/// Request to provision a user
#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    username: String,
}

/// Provision a user with a unique handle
async fn create_user(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateUserRequest>,
) -> WisperResult<(StatusCode, Json<User>)> {
    validation::validate_username(&req.username).map_err(validation::validation_errors_to_error)?;

    let user = ctx.ledger.create_user(req.username.trim()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Look up a user by id
async fn get_user(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> WisperResult<Json<User>> {
    let user = ctx
        .ledger
        .get_user(id)
        .await?
        .ok_or_else(|| WisperError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(user))
}
