/// Wisper content endpoints: feed, authoring, votes, comments
use crate::{
    api::middleware,
    context::AppContext,
    db::models::{Comment, VoteType, Wisper},
    error::WisperResult,
    validation,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build wisper routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/wispers", get(list_wispers).post(create_wisper))
        .route("/api/user/wispers", get(user_wispers))
        .route("/api/user/voted-wispers", get(voted_wispers))
        .route("/api/user/voted-wisper-ids", get(voted_wisper_ids))
        .route("/api/wispers/:id", delete(delete_wisper))
        .route("/api/wispers/:id/upvote", post(upvote_wisper))
        .route("/api/wispers/:id/remove-upvote", post(remove_upvote))
        .route(
            "/api/wispers/:id/comments",
            get(get_comments).post(create_comment),
        )
}

/// Request to create a wisper
#[derive(Debug, Deserialize)]
struct CreateWisperRequest {
    content: String,
}

/// Request to create a comment
#[derive(Debug, Deserialize)]
struct CreateCommentRequest {
    content: String,
}

/// Response listing the wispers the actor has voted on
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VotedWisperIdsResponse {
    wisper_ids: Vec<i64>,
}

/// Public feed, newest first
async fn list_wispers(State(ctx): State<AppContext>) -> WisperResult<Json<Vec<Wisper>>> {
    let wispers = ctx.ledger.get_wispers().await?;
    Ok(Json(wispers))
}

/// Create a new wisper
async fn create_wisper(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<CreateWisperRequest>,
) -> WisperResult<(StatusCode, Json<Wisper>)> {
    let actor = middleware::require_actor(&headers)?;
    validation::validate_wisper_content(&req.content)
        .map_err(validation::validation_errors_to_error)?;

    let wisper = ctx.ledger.create_wisper(actor, &req.content).await?;
    Ok((StatusCode::CREATED, Json(wisper)))
}

/// The actor's own wispers, newest first
async fn user_wispers(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> WisperResult<Json<Vec<Wisper>>> {
    let actor = middleware::require_actor(&headers)?;
    let wispers = ctx.ledger.get_user_wispers(actor).await?;
    Ok(Json(wispers))
}

/// Full records of the wispers the actor has an active vote on
async fn voted_wispers(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> WisperResult<Json<Vec<Wisper>>> {
    let actor = middleware::require_actor(&headers)?;
    let wispers = ctx.votes.get_voted_wispers(actor).await?;
    Ok(Json(wispers))
}

/// Ids only; backs the "has this viewer already voted" check
async fn voted_wisper_ids(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> WisperResult<Json<VotedWisperIdsResponse>> {
    let actor = middleware::require_actor(&headers)?;
    let wisper_ids = ctx.votes.list_voted_wisper_ids(actor).await?;
    Ok(Json(VotedWisperIdsResponse { wisper_ids }))
}

/// Delete the actor's wisper; responds with the remaining feed
async fn delete_wisper(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> WisperResult<Json<Vec<Wisper>>> {
    let actor = middleware::require_actor(&headers)?;
    ctx.ledger.delete_wisper(id, actor).await?;

    let wispers = ctx.ledger.get_wispers().await?;
    Ok(Json(wispers))
}

/// Cast an upvote; notifies the author on a newly created vote
async fn upvote_wisper(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> WisperResult<Json<Wisper>> {
    let actor = middleware::require_actor(&headers)?;
    let outcome = ctx.votes.cast_vote(id, actor, VoteType::Upvote).await?;

    // A repeat cast is a no-op and must not re-notify the author
    if outcome.created {
        ctx.notifier.notify_like(&outcome.wisper, actor).await?;
    }

    Ok(Json(outcome.wisper))
}

/// Retract the actor's upvote
async fn remove_upvote(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> WisperResult<Json<Wisper>> {
    let actor = middleware::require_actor(&headers)?;
    let wisper = ctx.votes.retract_vote(id, actor).await?;
    Ok(Json(wisper))
}

/// Comment on a wisper; notifies the author
async fn create_comment(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<CreateCommentRequest>,
) -> WisperResult<(StatusCode, Json<Comment>)> {
    let actor = middleware::require_actor(&headers)?;
    validation::validate_comment_content(&req.content)
        .map_err(validation::validation_errors_to_error)?;

    let comment = ctx.ledger.create_comment(id, actor, &req.content).await?;

    if let Some(wisper) = ctx.ledger.get_wisper(id).await? {
        ctx.notifier.notify_comment(&wisper, actor).await?;
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Comment thread for a wisper, oldest first
async fn get_comments(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> WisperResult<Json<Vec<Comment>>> {
    let comments = ctx.ledger.get_comments(id).await?;
    Ok(Json(comments))
}
