//! Command handlers for the Media service.

use socialnet_core::channel::names;
use socialnet_core::clock::Clock;
use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::event::{EntityEvent, EventContext};
use socialnet_core::store::{EntityStore, ObjectStorage};
use socialnet_propagation::{CrossServiceValidator, Publisher, Reference};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::commands::{DeleteMedia, UploadMedia};
use crate::domain::entities::Media;

/// Object key for a new upload by `user_id`.
fn object_key(user_id: i64) -> String {
    format!("media/{user_id}/{}", Uuid::new_v4())
}

/// Handles the `UploadMedia` command.
///
/// The object is stored before its row is inserted; if the insert fails the
/// object is removed again. Publishes `media.upload`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty body or content type, the
/// validator's reference errors, or the storage / store error.
pub async fn handle_upload_media(
    command: &UploadMedia,
    clock: &dyn Clock,
    store: &dyn EntityStore<Media>,
    storage: &dyn ObjectStorage,
    validator: &CrossServiceValidator,
    publisher: &Publisher,
) -> Result<Media, DomainError> {
    if command.bytes.is_empty() {
        return Err(DomainError::Validation("media body must not be empty".into()));
    }
    let content_type = command.content_type.trim();
    if content_type.is_empty() {
        return Err(DomainError::Validation("content type is required".into()));
    }

    let mut references = vec![Reference::new(EntityKind::User, command.user_id)];
    if let Some(post_id) = command.post_id {
        references.push(Reference::new(EntityKind::Post, post_id));
    }
    validator.require_all(&references).await?;

    let key = object_key(command.user_id);
    let size_bytes = command.bytes.len() as u64;
    storage.put(&key, command.bytes.clone(), content_type).await?;

    let inserted = store
        .insert(Media {
            media_id: 0,
            user_id: command.user_id,
            post_id: command.post_id,
            object_key: key.clone(),
            content_type: content_type.to_owned(),
            size_bytes,
            created_at: clock.now(),
        })
        .await;
    let media = match inserted {
        Ok(media) => media,
        Err(err) => {
            if let Err(cleanup) = storage.delete(&key).await {
                warn!(object_key = %key, error = %cleanup, "failed to remove object after insert error");
            }
            return Err(err);
        }
    };
    info!(
        media_id = media.media_id,
        user_id = media.user_id,
        size_bytes,
        correlation_id = %command.correlation_id,
        "media uploaded"
    );

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::MEDIA_UPLOADED, &media),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(media)
}

/// Handles the `DeleteMedia` command: removes the row and its object, then
/// publishes `media.deleted`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the media does not exist, or the
/// storage error if the object could not be removed.
pub async fn handle_delete_media(
    command: &DeleteMedia,
    store: &dyn EntityStore<Media>,
    storage: &dyn ObjectStorage,
    publisher: &Publisher,
) -> Result<Media, DomainError> {
    let media = store
        .find(command.media_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::Media,
            id: command.media_id,
        })?;
    storage.delete(&media.object_key).await?;
    store.delete(media.media_id).await?;
    info!(media_id = media.media_id, correlation_id = %command.correlation_id, "media deleted");

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::MEDIA_DELETED, &media),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(media)
}
