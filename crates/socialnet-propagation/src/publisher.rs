//! Event publisher shared by write paths and cascade handlers.
//!
//! Publishing is not atomic with the local commit that precedes it: if the
//! process dies between the two, the event is lost. The orphan sweep in
//! `reconcile` is the repair path for deletions dropped this way.

use std::sync::Arc;

use socialnet_core::channel::{ChannelError, EventChannel, RecordPosition};
use socialnet_core::clock::Clock;
use socialnet_core::event::{DomainEvent, EventContext, EventEnvelope};
use tracing::{debug, error};

/// Wraps domain events in envelopes and appends them to the channel.
#[derive(Clone)]
pub struct Publisher {
    channel: Arc<dyn EventChannel>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").finish_non_exhaustive()
    }
}

impl Publisher {
    /// Creates a new `Publisher`.
    #[must_use]
    pub fn new(channel: Arc<dyn EventChannel>, clock: Arc<dyn Clock>) -> Self {
        Self { channel, clock }
    }

    /// The clock used to timestamp envelopes.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Publishes `event`, failing if the channel rejects it.
    ///
    /// # Errors
    ///
    /// Returns the channel's error; the caller decides whether to retry.
    pub async fn publish(
        &self,
        event: &dyn DomainEvent,
        context: EventContext,
    ) -> Result<EventEnvelope, ChannelError> {
        let envelope = EventEnvelope::new(event, context, self.clock.as_ref());
        self.publish_envelope(&envelope).await?;
        Ok(envelope)
    }

    /// Publishes `event` after the local write that produced it has
    /// committed. A failure is logged and swallowed: the write stays
    /// successful and the event is lost.
    pub async fn publish_after_commit(
        &self,
        event: &dyn DomainEvent,
        context: EventContext,
    ) -> Option<EventEnvelope> {
        match self.publish(event, context).await {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                error!(
                    channel = event.channel(),
                    partition_key = %event.partition_key(),
                    correlation_id = %context.correlation_id,
                    error = %err,
                    "event dropped after local commit"
                );
                None
            }
        }
    }

    /// Appends an already-built envelope as is.
    ///
    /// # Errors
    ///
    /// Returns the channel's error.
    pub async fn publish_envelope(
        &self,
        envelope: &EventEnvelope,
    ) -> Result<RecordPosition, ChannelError> {
        let position = self.channel.publish(envelope).await?;
        debug!(
            channel = %envelope.channel,
            partition = position.partition,
            offset = position.offset,
            event_id = %envelope.event_id,
            correlation_id = %envelope.correlation_id,
            "event published"
        );
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use socialnet_channel::InMemoryChannel;
    use socialnet_core::channel::names;
    use socialnet_test_support::{FailingChannel, FixedClock};
    use uuid::Uuid;

    use super::*;

    #[derive(Debug)]
    struct UserDeleted(i64);

    impl DomainEvent for UserDeleted {
        fn channel(&self) -> &str {
            names::USER_DELETED
        }

        fn partition_key(&self) -> String {
            self.0.to_string()
        }

        fn to_payload(&self) -> serde_json::Value {
            json!({ "user_id": self.0 })
        }
    }

    #[tokio::test]
    async fn test_publish_appends_envelope_to_channel() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let clock = FixedClock::default();
        let publisher = Publisher::new(Arc::new(channel.clone()), Arc::new(clock));
        let correlation_id = Uuid::new_v4();

        // Act
        let envelope = publisher
            .publish(&UserDeleted(7), EventContext::new(correlation_id))
            .await
            .unwrap();

        // Assert
        let records = channel.records(names::USER_DELETED);
        assert_eq!(records, vec![envelope.clone()]);
        assert_eq!(envelope.partition_key, "7");
        assert_eq!(envelope.correlation_id, correlation_id);
        assert_eq!(envelope.occurred_at, clock.0);
    }

    #[tokio::test]
    async fn test_publish_after_commit_swallows_channel_failure() {
        let publisher = Publisher::new(Arc::new(FailingChannel), Arc::new(FixedClock::default()));

        let result = publisher
            .publish_after_commit(&UserDeleted(7), EventContext::new(Uuid::new_v4()))
            .await;

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_publish_surfaces_channel_failure() {
        let publisher = Publisher::new(Arc::new(FailingChannel), Arc::new(FixedClock::default()));

        let result = publisher
            .publish(&UserDeleted(7), EventContext::new(Uuid::new_v4()))
            .await;

        assert!(matches!(result, Err(ChannelError::Unavailable(_))));
    }
}
