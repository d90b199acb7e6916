//! Query handlers for the Media service.

use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::store::{EntityStore, ObjectStorage};

use crate::domain::entities::{Media, MediaView};

/// Retrieves a media row with the URL of its object.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no such media exists.
pub async fn get_media(
    media_id: i64,
    store: &dyn EntityStore<Media>,
    storage: &dyn ObjectStorage,
) -> Result<MediaView, DomainError> {
    let media = store.find(media_id).await?.ok_or(DomainError::NotFound {
        kind: EntityKind::Media,
        id: media_id,
    })?;
    let url = storage.url(&media.object_key);
    Ok(MediaView { media, url })
}

/// Whether a media row exists.
///
/// # Errors
///
/// Returns the store's error.
pub async fn media_exists(media_id: i64, store: &dyn EntityStore<Media>) -> Result<bool, DomainError> {
    store.exists(media_id).await
}

#[cfg(test)]
mod tests {
    use socialnet_store::{InMemoryEntityStore, InMemoryObjectStorage};
    use socialnet_test_support::FixedClock;

    use super::*;

    #[tokio::test]
    async fn test_get_media_includes_object_url_in_flattened_json() {
        // Arrange
        let store = InMemoryEntityStore::<Media>::new();
        let storage = InMemoryObjectStorage::new("http://objects.test/");
        let stored = store
            .insert(Media {
                media_id: 0,
                user_id: 7,
                post_id: None,
                object_key: "media/7/a".into(),
                content_type: "image/png".into(),
                size_bytes: 3,
                created_at: FixedClock::default().0,
            })
            .await
            .unwrap();

        // Act
        let view = get_media(stored.media_id, &store, &storage).await.unwrap();

        // Assert
        assert_eq!(view.url, "http://objects.test/media/7/a");
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["media_id"], stored.media_id);
        assert_eq!(json["url"], "http://objects.test/media/7/a");
        assert!(media_exists(stored.media_id, &store).await.unwrap());
    }
}
