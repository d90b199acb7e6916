//! Routes for the User service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use socialnet_user::application::{command_handlers, query_handlers};
use socialnet_user::domain::commands;
use socialnet_user::domain::entities::User;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Display name.
    pub username: String,
    /// Contact address.
    pub email: String,
}

/// POST /
#[instrument(skip(state, request), fields(username = %request.username))]
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let command = commands::CreateUser {
        correlation_id: Uuid::new_v4(),
        username: request.username,
        email: request.email,
    };
    let user =
        command_handlers::handle_create_user(&command, state.clock.as_ref(), &*state.stores.users)
            .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = query_handlers::get_user_by_id(user_id, &*state.stores.users).await?;
    Ok(Json(user))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteUser {
        correlation_id: Uuid::new_v4(),
        user_id,
    };
    command_handlers::handle_delete_user(&command, &*state.stores.users, &state.publisher).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /{id}/exists
#[instrument(skip(state))]
async fn user_exists(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<bool>, ApiError> {
    Ok(Json(
        query_handlers::user_exists(user_id, &*state.stores.users).await?,
    ))
}

/// Returns the router for the user service.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/{id}", get(get_user).delete(delete_user))
        .route("/{id}/exists", get(user_exists))
}
