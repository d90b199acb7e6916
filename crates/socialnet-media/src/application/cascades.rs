//! Cascade wiring: media of a deleted user or post is removed along with
//! the stored objects.

use std::sync::Arc;

use async_trait::async_trait;
use socialnet_core::error::DomainError;
use socialnet_core::store::{EntityStore, ObjectStorage};
use socialnet_propagation::{CascadeHandler, Publisher, RowCleanup};

use crate::domain::entities::Media;

/// Removes the stored object behind a media row.
pub struct ObjectCleanup {
    storage: Arc<dyn ObjectStorage>,
}

impl ObjectCleanup {
    /// Creates a cleanup against `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl RowCleanup<Media> for ObjectCleanup {
    async fn cleanup(&self, row: &Media) -> Result<(), DomainError> {
        self.storage.delete(&row.object_key).await
    }
}

/// Cascade handlers for every edge ending at media, each removing objects.
#[must_use]
pub fn cascade_handlers(
    store: &Arc<dyn EntityStore<Media>>,
    storage: &Arc<dyn ObjectStorage>,
    publisher: &Publisher,
) -> Vec<Arc<CascadeHandler<Media>>> {
    let cleanup: Arc<dyn RowCleanup<Media>> = Arc::new(ObjectCleanup::new(Arc::clone(storage)));
    CascadeHandler::for_entity(store, publisher)
        .into_iter()
        .map(|handler| Arc::new(handler.with_cleanup(Arc::clone(&cleanup))))
        .collect()
}

#[cfg(test)]
mod tests {
    use socialnet_channel::InMemoryChannel;
    use socialnet_core::channel::names;
    use socialnet_core::entity::OwnerField;
    use socialnet_core::event::EventContext;
    use socialnet_store::{InMemoryEntityStore, InMemoryObjectStorage};
    use socialnet_test_support::FixedClock;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_post_deletion_removes_attached_media_and_objects_only() {
        // Arrange
        let clock = FixedClock::default();
        let channel = InMemoryChannel::with_system_channels();
        let publisher = Publisher::new(Arc::new(channel.clone()), Arc::new(clock));
        let objects = Arc::new(InMemoryObjectStorage::new("http://objects.test"));
        let memory = Arc::new(InMemoryEntityStore::<Media>::new());
        for (key, post_id) in [("media/7/a", Some(1)), ("media/7/b", None)] {
            objects.put(key, vec![1, 2, 3], "image/png").await.unwrap();
            memory
                .insert(Media {
                    media_id: 0,
                    user_id: 7,
                    post_id,
                    object_key: key.into(),
                    content_type: "image/png".into(),
                    size_bytes: 3,
                    created_at: clock.0,
                })
                .await
                .unwrap();
        }
        let store: Arc<dyn EntityStore<Media>> = memory.clone();
        let storage: Arc<dyn ObjectStorage> = objects.clone();
        let handlers = cascade_handlers(&store, &storage, &publisher);
        let by_post = handlers
            .iter()
            .find(|handler| handler.edge().field == OwnerField::PostId)
            .unwrap();

        // Act
        by_post
            .cascade_owner(1, EventContext::new(Uuid::new_v4()))
            .await
            .unwrap();

        // Assert
        assert_eq!(handlers.len(), 2);
        assert_eq!(memory.len(), 1);
        assert!(objects.get("media/7/a").is_none());
        assert!(objects.get("media/7/b").is_some());
        assert_eq!(channel.records(names::MEDIA_DELETED).len(), 1);
    }
}
