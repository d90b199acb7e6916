//! Event handlers for the Notification service.

use std::sync::Arc;

use async_trait::async_trait;
use socialnet_core::channel::{Message, names};
use socialnet_core::clock::Clock;
use socialnet_core::entity::OwnerField;
use socialnet_core::handler::{EventHandler, HandlerError, HandlerOutcome};
use socialnet_core::store::EntityStore;
use socialnet_propagation::HandlerBinding;
use tracing::{debug, info};

use crate::domain::entities::{Notification, NotificationKind};

/// Consumer group of the follow notifier.
pub const FOLLOW_NOTIFIER_GROUP: &str = "notification-service.follow-notifier";

/// Creates a `Follow` notification for the followed user on every
/// `subscription.created`.
///
/// Redelivery of the same subscription event creates nothing new: the
/// notification is keyed by the subscription id.
pub struct FollowNotifier {
    store: Arc<dyn EntityStore<Notification>>,
    clock: Arc<dyn Clock>,
}

impl FollowNotifier {
    /// Creates a notifier writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore<Notification>>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Binds the notifier to `subscription.created`.
    #[must_use]
    pub fn binding(self: Arc<Self>) -> HandlerBinding {
        HandlerBinding::new(names::SUBSCRIPTION_CREATED, FOLLOW_NOTIFIER_GROUP, self)
    }
}

fn required(message: &Message, key: &str) -> Result<i64, HandlerError> {
    message.envelope.payload_i64(key).ok_or_else(|| {
        HandlerError::NonRetryable(format!(
            "{} payload has no integer field {key}",
            message.channel()
        ))
    })
}

#[async_trait]
impl EventHandler for FollowNotifier {
    fn name(&self) -> &str {
        FOLLOW_NOTIFIER_GROUP
    }

    async fn handle(&self, message: &Message) -> Result<HandlerOutcome, HandlerError> {
        let subscription_id = required(message, "subscription_id")?;
        let follower_id = required(message, "follower_id")?;
        let followee_id = required(message, "followee_id")?;

        let existing = self
            .store
            .find_by_owners(&[
                (OwnerField::UserId, followee_id),
                (OwnerField::ActorId, follower_id),
            ])
            .await?;
        if existing
            .iter()
            .any(|n| n.kind == NotificationKind::Follow && n.source_id == subscription_id)
        {
            debug!(subscription_id, "follow notification already exists");
            return Ok(HandlerOutcome::default());
        }

        let notification = self
            .store
            .insert(Notification {
                notification_id: 0,
                user_id: followee_id,
                actor_id: follower_id,
                kind: NotificationKind::Follow,
                source_id: subscription_id,
                read: false,
                created_at: self.clock.now(),
            })
            .await?;
        info!(
            notification_id = notification.notification_id,
            user_id = followee_id,
            correlation_id = %message.envelope.correlation_id,
            "follow notification created"
        );
        Ok(HandlerOutcome {
            affected_rows: 1,
            follow_on_events: 0,
        })
    }
}
