//! Routes for the Media service.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use socialnet_media::application::{command_handlers, query_handlers};
use socialnet_media::domain::commands;
use socialnet_media::domain::entities::MediaView;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of POST /; the object itself is the raw request body.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Uploading user.
    pub user_id: i64,
    /// Post to attach the media to.
    pub post_id: Option<i64>,
    /// MIME type of the body.
    pub content_type: String,
}

/// POST /?user_id=&post_id=&content_type=
#[instrument(skip(state, body), fields(size = body.len()))]
async fn upload_media(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<MediaView>), ApiError> {
    let command = commands::UploadMedia {
        correlation_id: Uuid::new_v4(),
        user_id: params.user_id,
        post_id: params.post_id,
        content_type: params.content_type,
        bytes: body.to_vec(),
    };
    let media = command_handlers::handle_upload_media(
        &command,
        state.clock.as_ref(),
        &*state.stores.media,
        &*state.storage,
        &state.validator,
        &state.publisher,
    )
    .await?;
    let url = state.storage.url(&media.object_key);
    Ok((StatusCode::CREATED, Json(MediaView { media, url })))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_media(
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
) -> Result<Json<MediaView>, ApiError> {
    Ok(Json(
        query_handlers::get_media(media_id, &*state.stores.media, &*state.storage).await?,
    ))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_media(
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteMedia {
        correlation_id: Uuid::new_v4(),
        media_id,
    };
    command_handlers::handle_delete_media(
        &command,
        &*state.stores.media,
        &*state.storage,
        &state.publisher,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /{id}/exists
#[instrument(skip(state))]
async fn media_exists(
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
) -> Result<Json<bool>, ApiError> {
    Ok(Json(
        query_handlers::media_exists(media_id, &*state.stores.media).await?,
    ))
}

/// Returns the router for the media service.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_media))
        .route("/{id}", get(get_media).delete(delete_media))
        .route("/{id}/exists", get(media_exists))
}
