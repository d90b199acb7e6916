//! Routes for the Comment service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use socialnet_comment::application::{command_handlers, query_handlers};
use socialnet_comment::domain::commands;
use socialnet_comment::domain::entities::Comment;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    /// The post being commented on.
    pub post_id: i64,
    /// The commenting user.
    pub user_id: i64,
    /// Comment text.
    pub body: String,
}

/// Request body for PUT /{id}.
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    /// Replacement text.
    pub body: String,
}

/// POST /
#[instrument(skip(state, request), fields(post_id = request.post_id, user_id = request.user_id))]
async fn create_comment(
    State(state): State<AppState>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let command = commands::CreateComment {
        correlation_id: Uuid::new_v4(),
        post_id: request.post_id,
        user_id: request.user_id,
        body: request.body,
    };
    let comment = command_handlers::handle_create_comment(
        &command,
        state.clock.as_ref(),
        &*state.stores.comments,
        &state.validator,
        &state.publisher,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /{id}
#[instrument(skip(state, request))]
async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let command = commands::UpdateComment {
        correlation_id: Uuid::new_v4(),
        comment_id,
        body: request.body,
    };
    let comment = command_handlers::handle_update_comment(
        &command,
        state.clock.as_ref(),
        &*state.stores.comments,
        &state.publisher,
    )
    .await?;
    Ok(Json(comment))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteComment {
        correlation_id: Uuid::new_v4(),
        comment_id,
    };
    command_handlers::handle_delete_comment(&command, &*state.stores.comments, &state.publisher)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(
        query_handlers::get_comment_by_id(comment_id, &*state.stores.comments).await?,
    ))
}

/// GET /{id}/exists
#[instrument(skip(state))]
async fn comment_exists(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
) -> Result<Json<bool>, ApiError> {
    Ok(Json(
        query_handlers::comment_exists(comment_id, &*state.stores.comments).await?,
    ))
}

/// GET /posts/{post_id}/count
#[instrument(skip(state))]
async fn count_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<u64>, ApiError> {
    Ok(Json(
        query_handlers::count_comments_by_post(post_id, &*state.stores.comments).await?,
    ))
}

/// GET /posts/{post_id}
#[instrument(skip(state))]
async fn list_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(
        query_handlers::list_comments_by_post(post_id, &*state.stores.comments).await?,
    ))
}

/// Returns the router for the comment service.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_comment))
        .route(
            "/{id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/{id}/exists", get(comment_exists))
        .route("/posts/{post_id}", get(list_by_post))
        .route("/posts/{post_id}/count", get(count_by_post))
}
