//! Routes for the Notification service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use socialnet_notification::application::{command_handlers, query_handlers};
use socialnet_notification::domain::commands;
use socialnet_notification::domain::entities::Notification;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /users/{user_id}
#[instrument(skip(state))]
async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(
        query_handlers::list_notifications_for_user(user_id, &*state.stores.notifications).await?,
    ))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteNotification {
        correlation_id: Uuid::new_v4(),
        notification_id,
    };
    command_handlers::handle_delete_notification(&command, &*state.stores.notifications).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for the notification service.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}", get(list_for_user))
        .route("/{id}", delete(delete_notification))
}
