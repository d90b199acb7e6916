//! Cascade wiring for both like tables.

use std::sync::Arc;

use socialnet_core::store::EntityStore;
use socialnet_propagation::{CascadeHandler, Publisher};

use crate::domain::entities::{CommentLike, PostLike};

/// Cascade handlers for the edges ending at post likes.
#[must_use]
pub fn post_like_cascades(
    store: &Arc<dyn EntityStore<PostLike>>,
    publisher: &Publisher,
) -> Vec<Arc<CascadeHandler<PostLike>>> {
    CascadeHandler::for_entity(store, publisher)
        .into_iter()
        .map(Arc::new)
        .collect()
}

/// Cascade handlers for the edges ending at comment likes.
#[must_use]
pub fn comment_like_cascades(
    store: &Arc<dyn EntityStore<CommentLike>>,
    publisher: &Publisher,
) -> Vec<Arc<CascadeHandler<CommentLike>>> {
    CascadeHandler::for_entity(store, publisher)
        .into_iter()
        .map(Arc::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;
    use socialnet_channel::InMemoryChannel;
    use socialnet_core::channel::{Message, names};
    use socialnet_core::entity::OwnerField;
    use socialnet_core::event::EventEnvelope;
    use socialnet_core::handler::EventHandler;
    use socialnet_store::InMemoryEntityStore;
    use socialnet_test_support::FixedClock;
    use uuid::Uuid;

    use super::*;

    fn comment_deleted(comment_id: i64) -> Message {
        Message {
            partition: 1,
            offset: 4,
            envelope: EventEnvelope {
                event_id: Uuid::now_v7(),
                channel: names::COMMENT_DELETED.to_owned(),
                partition_key: "3".to_owned(),
                payload: json!({ "comment_id": comment_id, "post_id": 3, "body": "bye" }),
                headers: BTreeMap::new(),
                correlation_id: Uuid::new_v4(),
                causation_id: None,
                occurred_at: FixedClock::default().0,
            },
        }
    }

    #[tokio::test]
    async fn test_comment_deleted_twice_leaves_zero_likes_without_error() {
        // Arrange
        let clock = FixedClock::default();
        let channel = InMemoryChannel::with_system_channels();
        let publisher = Publisher::new(Arc::new(channel.clone()), Arc::new(clock));
        let memory = Arc::new(InMemoryEntityStore::<CommentLike>::new());
        for user_id in [7, 8] {
            memory
                .insert(CommentLike { like_id: 0, comment_id: 5, user_id, created_at: clock.0 })
                .await
                .unwrap();
        }
        let store: Arc<dyn EntityStore<CommentLike>> = memory.clone();
        let handlers = comment_like_cascades(&store, &publisher);
        let by_comment = handlers
            .iter()
            .find(|handler| handler.edge().field == OwnerField::CommentId)
            .unwrap();
        let event = comment_deleted(5);

        // Act
        let first = by_comment.handle(&event).await.unwrap();
        let second = by_comment.handle(&event).await.unwrap();

        // Assert
        assert_eq!(first.affected_rows, 2);
        assert_eq!(second.affected_rows, 0);
        assert_eq!(store.count_by_owner(OwnerField::CommentId, 5).await.unwrap(), 0);
        assert_eq!(channel.records(names::COMMENT_LIKE_DELETED).len(), 2);
    }

    #[test]
    fn test_each_like_table_listens_on_its_owner_channels() {
        let channel = InMemoryChannel::with_system_channels();
        let publisher = Publisher::new(Arc::new(channel), Arc::new(FixedClock::default()));
        let post_likes: Arc<dyn EntityStore<PostLike>> = Arc::new(InMemoryEntityStore::new());
        let comment_likes: Arc<dyn EntityStore<CommentLike>> = Arc::new(InMemoryEntityStore::new());

        let mut post_triggers: Vec<_> = post_like_cascades(&post_likes, &publisher)
            .iter()
            .map(|handler| handler.edge().trigger())
            .collect();
        let mut comment_triggers: Vec<_> = comment_like_cascades(&comment_likes, &publisher)
            .iter()
            .map(|handler| handler.edge().trigger())
            .collect();
        post_triggers.sort_unstable();
        comment_triggers.sort_unstable();

        assert_eq!(post_triggers, vec![names::POST_DELETED, names::USER_DELETED]);
        assert_eq!(comment_triggers, vec![names::COMMENT_DELETED, names::USER_DELETED]);
    }
}
