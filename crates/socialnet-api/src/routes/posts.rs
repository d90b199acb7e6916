//! Routes for the Post service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use socialnet_post::application::{command_handlers, query_handlers};
use socialnet_post::domain::commands;
use socialnet_post::domain::entities::Post;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    /// Author.
    pub user_id: i64,
    /// Title.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
}

/// POST /
#[instrument(skip(state, request), fields(user_id = request.user_id))]
async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let command = commands::CreatePost {
        correlation_id: Uuid::new_v4(),
        user_id: request.user_id,
        title: request.title,
        body: request.body,
    };
    let post = command_handlers::handle_create_post(
        &command,
        state.clock.as_ref(),
        &*state.stores.posts,
        &state.validator,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(
        query_handlers::get_post_by_id(post_id, &*state.stores.posts).await?,
    ))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeletePost {
        correlation_id: Uuid::new_v4(),
        post_id,
    };
    command_handlers::handle_delete_post(&command, &*state.stores.posts, &state.publisher).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /{id}/exists
#[instrument(skip(state))]
async fn post_exists(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<bool>, ApiError> {
    Ok(Json(
        query_handlers::post_exists(post_id, &*state.stores.posts).await?,
    ))
}

/// GET /users/{user_id}/count
#[instrument(skip(state))]
async fn count_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<u64>, ApiError> {
    Ok(Json(
        query_handlers::count_posts_by_user(user_id, &*state.stores.posts).await?,
    ))
}

/// Returns the router for the post service.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/{id}", get(get_post).delete(delete_post))
        .route("/{id}/exists", get(post_exists))
        .route("/users/{user_id}/count", get(count_by_user))
}
