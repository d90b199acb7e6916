//! Routes for the Subscription service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use socialnet_subscription::application::{command_handlers, query_handlers};
use socialnet_subscription::domain::commands;
use socialnet_subscription::domain::entities::Subscription;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    /// The following user.
    pub follower_id: i64,
    /// The followed user.
    pub followee_id: i64,
}

/// POST /
#[instrument(skip(state, request), fields(follower_id = request.follower_id, followee_id = request.followee_id))]
async fn follow(
    State(state): State<AppState>,
    Json(request): Json<FollowRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let command = commands::Follow {
        correlation_id: Uuid::new_v4(),
        follower_id: request.follower_id,
        followee_id: request.followee_id,
    };
    let subscription = command_handlers::handle_follow(
        &command,
        state.clock.as_ref(),
        &*state.stores.subscriptions,
        &state.validator,
        &state.publisher,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn unfollow(
    State(state): State<AppState>,
    Path(subscription_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::Unfollow {
        correlation_id: Uuid::new_v4(),
        subscription_id,
    };
    command_handlers::handle_unfollow(&command, &*state.stores.subscriptions, &state.publisher)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{user_id}/followers/count
#[instrument(skip(state))]
async fn follower_count(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<u64>, ApiError> {
    Ok(Json(
        query_handlers::follower_count(user_id, &*state.stores.subscriptions).await?,
    ))
}

/// Returns the router for the subscription service.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(follow))
        .route("/{id}", delete(unfollow))
        .route("/users/{user_id}/followers/count", get(follower_count))
}
