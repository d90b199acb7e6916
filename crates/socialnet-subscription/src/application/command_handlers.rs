//! Command handlers for the Subscription service.

use socialnet_core::channel::names;
use socialnet_core::clock::Clock;
use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::event::{EntityEvent, EventContext};
use socialnet_core::store::EntityStore;
use socialnet_propagation::{CrossServiceValidator, Publisher, Reference};
use tracing::info;

use crate::domain::commands::{Follow, Unfollow};
use crate::domain::entities::Subscription;

/// Handles the `Follow` command and publishes `subscription.created`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a self-follow, the validator's
/// reference errors if either user is missing, or `DomainError::Conflict`
/// if the subscription already exists.
pub async fn handle_follow(
    command: &Follow,
    clock: &dyn Clock,
    store: &dyn EntityStore<Subscription>,
    validator: &CrossServiceValidator,
    publisher: &Publisher,
) -> Result<Subscription, DomainError> {
    if command.follower_id == command.followee_id {
        return Err(DomainError::Validation("users cannot follow themselves".into()));
    }
    validator
        .require_all(&[
            Reference::new(EntityKind::User, command.follower_id),
            Reference::new(EntityKind::User, command.followee_id),
        ])
        .await?;

    let subscription = store
        .insert(Subscription {
            subscription_id: 0,
            follower_id: command.follower_id,
            followee_id: command.followee_id,
            created_at: clock.now(),
        })
        .await
        .map_err(|err| match err {
            DomainError::Conflict(_) => DomainError::Conflict(format!(
                "user {} already follows user {}",
                command.follower_id, command.followee_id
            )),
            other => other,
        })?;
    info!(
        subscription_id = subscription.subscription_id,
        follower_id = subscription.follower_id,
        followee_id = subscription.followee_id,
        correlation_id = %command.correlation_id,
        "subscription created"
    );

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::SUBSCRIPTION_CREATED, &subscription),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(subscription)
}

/// Handles the `Unfollow` command and publishes `subscription.deleted`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the subscription does not exist.
pub async fn handle_unfollow(
    command: &Unfollow,
    store: &dyn EntityStore<Subscription>,
    publisher: &Publisher,
) -> Result<Subscription, DomainError> {
    let subscription = store
        .delete(command.subscription_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::Subscription,
            id: command.subscription_id,
        })?;
    info!(
        subscription_id = subscription.subscription_id,
        correlation_id = %command.correlation_id,
        "subscription deleted"
    );

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::SUBSCRIPTION_DELETED, &subscription),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(subscription)
}
