//! Routes for the Like service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use socialnet_like::application::{command_handlers, query_handlers};
use socialnet_like::domain::commands;
use socialnet_like::domain::entities::{CommentLike, PostLike};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /posts.
#[derive(Debug, Deserialize)]
pub struct LikePostRequest {
    /// The liked post.
    pub post_id: i64,
    /// The liking user.
    pub user_id: i64,
}

/// Request body for POST /comments.
#[derive(Debug, Deserialize)]
pub struct LikeCommentRequest {
    /// The liked comment.
    pub comment_id: i64,
    /// The liking user.
    pub user_id: i64,
}

/// POST /posts
#[instrument(skip(state, request), fields(post_id = request.post_id, user_id = request.user_id))]
async fn like_post(
    State(state): State<AppState>,
    Json(request): Json<LikePostRequest>,
) -> Result<(StatusCode, Json<PostLike>), ApiError> {
    let command = commands::LikePost {
        correlation_id: Uuid::new_v4(),
        post_id: request.post_id,
        user_id: request.user_id,
    };
    let like = command_handlers::handle_like_post(
        &command,
        state.clock.as_ref(),
        &*state.stores.post_likes,
        &state.validator,
        &state.publisher,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(like)))
}

/// DELETE /posts/{id}
#[instrument(skip(state))]
async fn unlike_post(
    State(state): State<AppState>,
    Path(like_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::UnlikePost {
        correlation_id: Uuid::new_v4(),
        like_id,
    };
    command_handlers::handle_unlike_post(&command, &*state.stores.post_likes, &state.publisher)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /posts/{post_id}/count
#[instrument(skip(state))]
async fn count_post_likes(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<u64>, ApiError> {
    Ok(Json(
        query_handlers::count_post_likes(post_id, &*state.stores.post_likes).await?,
    ))
}

/// POST /comments
#[instrument(skip(state, request), fields(comment_id = request.comment_id, user_id = request.user_id))]
async fn like_comment(
    State(state): State<AppState>,
    Json(request): Json<LikeCommentRequest>,
) -> Result<(StatusCode, Json<CommentLike>), ApiError> {
    let command = commands::LikeComment {
        correlation_id: Uuid::new_v4(),
        comment_id: request.comment_id,
        user_id: request.user_id,
    };
    let like = command_handlers::handle_like_comment(
        &command,
        state.clock.as_ref(),
        &*state.stores.comment_likes,
        &state.validator,
        &state.publisher,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(like)))
}

/// DELETE /comments/{id}
#[instrument(skip(state))]
async fn unlike_comment(
    State(state): State<AppState>,
    Path(like_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::UnlikeComment {
        correlation_id: Uuid::new_v4(),
        like_id,
    };
    command_handlers::handle_unlike_comment(
        &command,
        &*state.stores.comment_likes,
        &state.publisher,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /comments/{comment_id}/count
#[instrument(skip(state))]
async fn count_comment_likes(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
) -> Result<Json<u64>, ApiError> {
    Ok(Json(
        query_handlers::count_comment_likes(comment_id, &*state.stores.comment_likes).await?,
    ))
}

/// Returns the router for the like service.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(like_post))
        .route("/posts/{id}", delete(unlike_post))
        .route("/posts/{post_id}/count", get(count_post_likes))
        .route("/comments", post(like_comment))
        .route("/comments/{id}", delete(unlike_comment))
        .route("/comments/{comment_id}/count", get(count_comment_likes))
}
