//! Cascade deletion handler.
//!
//! One `CascadeHandler` serves one edge of the cascade graph: on a deletion
//! event for owner `O` it deletes every local row whose owner column equals
//! `O`, emitting a per-row deletion event first when the edge has a
//! follow-on channel.

use std::sync::Arc;

use async_trait::async_trait;
use socialnet_core::channel::Message;
use socialnet_core::entity::Entity;
use socialnet_core::error::DomainError;
use socialnet_core::event::{EntityEvent, EventContext};
use socialnet_core::graph::{CascadeEdge, edges_into};
use socialnet_core::handler::{EventHandler, HandlerError, HandlerOutcome};
use socialnet_core::store::EntityStore;
use tracing::debug;

use crate::publisher::Publisher;

/// Extra per-row work run before a row is cascade-deleted, such as removing
/// the stored object behind a media row. Must be idempotent.
#[async_trait]
pub trait RowCleanup<E>: Send + Sync {
    /// Cleans up after `row`.
    async fn cleanup(&self, row: &E) -> Result<(), DomainError>;
}

/// Deletes the rows of `E` that reference a deleted owner.
pub struct CascadeHandler<E: Entity> {
    edge: &'static CascadeEdge,
    name: String,
    store: Arc<dyn EntityStore<E>>,
    publisher: Publisher,
    cleanup: Option<Arc<dyn RowCleanup<E>>>,
}

impl<E: Entity> std::fmt::Debug for CascadeHandler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeHandler")
            .field("edge", self.edge)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> CascadeHandler<E> {
    /// Creates a handler for `edge`, whose target must be `E::KIND`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the edge targets another kind.
    pub fn new(
        edge: &'static CascadeEdge,
        store: Arc<dyn EntityStore<E>>,
        publisher: Publisher,
    ) -> Result<Self, DomainError> {
        if edge.target != E::KIND {
            return Err(DomainError::Validation(format!(
                "cascade edge {} targets {}, not {}",
                edge.group(),
                edge.target,
                E::KIND
            )));
        }
        Ok(Self {
            edge,
            name: edge.group(),
            store,
            publisher,
            cleanup: None,
        })
    }

    /// One handler per cascade-graph edge that deletes rows of `E`.
    #[must_use]
    pub fn for_entity(store: &Arc<dyn EntityStore<E>>, publisher: &Publisher) -> Vec<Self> {
        edges_into(E::KIND)
            .map(|edge| Self {
                edge,
                name: edge.group(),
                store: Arc::clone(store),
                publisher: publisher.clone(),
                cleanup: None,
            })
            .collect()
    }

    /// Runs `cleanup` for every row before it is deleted.
    #[must_use]
    pub fn with_cleanup(mut self, cleanup: Arc<dyn RowCleanup<E>>) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// The graph edge this handler serves.
    #[must_use]
    pub fn edge(&self) -> &'static CascadeEdge {
        self.edge
    }

    /// The store rows are deleted from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntityStore<E>> {
        &self.store
    }

    /// Deletes every row referencing `owner_id`.
    ///
    /// Rows are cleaned up and their follow-on events published before they
    /// are deleted together by id, so a failure part-way leaves the rows in
    /// place for the next delivery. Only the rows read here are deleted: a
    /// row committed after the read stays for a later delivery or the orphan
    /// sweep, which publishes its follow-on event. Running it again for the
    /// same owner deletes nothing and succeeds.
    ///
    /// # Errors
    ///
    /// Store and channel failures are retryable; anything else is not.
    pub async fn cascade_owner(
        &self,
        owner_id: i64,
        context: EventContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let field = self.edge.field;
        let rows = self.store.find_by_owner(field, owner_id).await?;

        if let Some(cleanup) = &self.cleanup {
            for row in &rows {
                cleanup.cleanup(row).await?;
            }
        }

        let mut follow_on_events = 0;
        if let Some(channel) = self.edge.follow_on() {
            for row in &rows {
                self.publisher
                    .publish(&EntityEvent::new(channel, row), context)
                    .await?;
                follow_on_events += 1;
            }
        }

        let ids: Vec<i64> = rows.iter().map(Entity::id).collect();
        let affected_rows = self.store.delete_many(&ids).await?;
        debug!(
            handler = %self.name,
            owner_id,
            deleted = affected_rows,
            follow_on_events,
            "cascade applied"
        );
        Ok(HandlerOutcome {
            affected_rows,
            follow_on_events,
        })
    }
}

#[async_trait]
impl<E: Entity> EventHandler for CascadeHandler<E> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, message: &Message) -> Result<HandlerOutcome, HandlerError> {
        let key = self.edge.trigger_key();
        let owner_id = message.envelope.payload_i64(key).ok_or_else(|| {
            HandlerError::NonRetryable(format!(
                "{} payload has no integer field {key}",
                message.channel()
            ))
        })?;
        self.cascade_owner(owner_id, EventContext::caused_by(&message.envelope))
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use socialnet_channel::InMemoryChannel;
    use socialnet_core::channel::names;
    use socialnet_core::entity::{EntityKind, OwnerField};
    use socialnet_core::event::EventEnvelope;
    use socialnet_store::InMemoryEntityStore;
    use socialnet_test_support::{FailingStore, FixedClock, LateInsertStore};
    use uuid::Uuid;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Post {
        post_id: i64,
        user_id: i64,
    }

    impl Entity for Post {
        const KIND: EntityKind = EntityKind::Post;
        const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId];

        fn id(&self) -> i64 {
            self.post_id
        }

        fn with_id(self, post_id: i64) -> Self {
            Self { post_id, ..self }
        }

        fn owner_id(&self, field: OwnerField) -> Option<i64> {
            (field == OwnerField::UserId).then_some(self.user_id)
        }

        fn partition_key(&self) -> i64 {
            self.user_id
        }
    }

    fn user_edge() -> &'static CascadeEdge {
        edges_into(EntityKind::Post).next().unwrap()
    }

    fn message(payload: serde_json::Value) -> Message {
        Message {
            partition: 0,
            offset: 0,
            envelope: EventEnvelope {
                event_id: Uuid::now_v7(),
                channel: names::USER_DELETED.to_owned(),
                partition_key: "7".to_owned(),
                payload,
                headers: std::collections::BTreeMap::new(),
                correlation_id: Uuid::new_v4(),
                causation_id: None,
                occurred_at: FixedClock::default().0,
            },
        }
    }

    fn publisher(channel: &InMemoryChannel) -> Publisher {
        Publisher::new(Arc::new(channel.clone()), Arc::new(FixedClock::default()))
    }

    #[test]
    fn test_new_rejects_edge_for_other_kind() {
        let channel = InMemoryChannel::with_system_channels();
        let edge = edges_into(EntityKind::Comment).next().unwrap();

        let result = CascadeHandler::<Post>::new(
            edge,
            Arc::new(InMemoryEntityStore::<Post>::new()),
            publisher(&channel),
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_follow_on_events_are_caused_by_trigger() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let store = Arc::new(InMemoryEntityStore::<Post>::new());
        store.insert(Post { post_id: 0, user_id: 7 }).await.unwrap();
        let handler = CascadeHandler::new(user_edge(), store, publisher(&channel)).unwrap();
        let trigger = message(json!({ "user_id": 7 }));

        // Act
        handler.handle(&trigger).await.unwrap();

        // Assert
        let emitted = channel.records(names::POST_DELETED);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].causation_id, Some(trigger.envelope.event_id));
        assert_eq!(emitted[0].correlation_id, trigger.envelope.correlation_id);
        assert_eq!(emitted[0].payload["post_id"], 1);
    }

    #[tokio::test]
    async fn test_row_committed_after_the_read_is_left_for_the_next_delivery() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let inner = Arc::new(InMemoryEntityStore::<Post>::new());
        inner.insert(Post { post_id: 0, user_id: 7 }).await.unwrap();
        let racing = Arc::new(LateInsertStore::new(
            inner.clone(),
            Post { post_id: 0, user_id: 7 },
        ));
        let handler = CascadeHandler::new(user_edge(), racing, publisher(&channel)).unwrap();
        let trigger = message(json!({ "user_id": 7 }));

        // Act
        let first = handler.handle(&trigger).await.unwrap();

        // Assert
        assert_eq!(first.affected_rows, 1);
        assert_eq!(first.follow_on_events, 1);
        assert_eq!(channel.records(names::POST_DELETED).len(), 1);
        assert_eq!(inner.len(), 1);

        let second = handler.handle(&trigger).await.unwrap();
        assert_eq!(second.affected_rows, 1);
        assert!(inner.is_empty());
        let deleted: Vec<Option<i64>> = channel
            .records(names::POST_DELETED)
            .iter()
            .map(|event| event.payload_i64("post_id"))
            .collect();
        assert_eq!(deleted, vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_missing_owner_field_is_non_retryable() {
        let channel = InMemoryChannel::with_system_channels();
        let handler = CascadeHandler::new(
            user_edge(),
            Arc::new(InMemoryEntityStore::<Post>::new()),
            publisher(&channel),
        )
        .unwrap();

        let result = handler.handle(&message(json!({ "user_id": "seven" }))).await;

        assert!(matches!(result, Err(HandlerError::NonRetryable(_))));
    }

    #[tokio::test]
    async fn test_store_failure_is_retryable() {
        let channel = InMemoryChannel::with_system_channels();
        let handler =
            CascadeHandler::new(user_edge(), Arc::new(FailingStore::<Post>::new()), publisher(&channel))
                .unwrap();

        let result = handler.handle(&message(json!({ "user_id": 7 }))).await;

        assert!(matches!(result, Err(HandlerError::Retryable(_))));
    }

    #[tokio::test]
    async fn test_publish_failure_leaves_rows_for_redelivery() {
        // Arrange
        let channel = InMemoryChannel::new();
        let store = Arc::new(InMemoryEntityStore::<Post>::new());
        store.insert(Post { post_id: 0, user_id: 7 }).await.unwrap();
        let handler = CascadeHandler::new(user_edge(), store.clone(), publisher(&channel)).unwrap();

        // Act
        let result = handler.handle(&message(json!({ "user_id": 7 }))).await;

        // Assert
        assert!(matches!(result, Err(HandlerError::Retryable(_))));
        assert_eq!(store.len(), 1);
    }
}
