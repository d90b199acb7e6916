//! Command handlers for the User service.

use socialnet_core::channel::names;
use socialnet_core::clock::Clock;
use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::event::{EntityEvent, EventContext};
use socialnet_core::store::EntityStore;
use socialnet_propagation::Publisher;
use tracing::info;

use crate::domain::commands::{CreateUser, DeleteUser};
use crate::domain::entities::User;

/// Handles the `CreateUser` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty username or an email
/// without `@`, or the store's error.
pub async fn handle_create_user(
    command: &CreateUser,
    clock: &dyn Clock,
    store: &dyn EntityStore<User>,
) -> Result<User, DomainError> {
    let username = command.username.trim();
    if username.is_empty() {
        return Err(DomainError::Validation("username must not be empty".into()));
    }
    if !command.email.contains('@') {
        return Err(DomainError::Validation(format!(
            "invalid email address: {}",
            command.email
        )));
    }

    let user = store
        .insert(User {
            user_id: 0,
            username: username.to_owned(),
            email: command.email.clone(),
            created_at: clock.now(),
        })
        .await?;
    info!(user_id = user.user_id, correlation_id = %command.correlation_id, "user created");
    Ok(user)
}

/// Handles the `DeleteUser` command: deletes the row, then publishes
/// `user.deleted`. Dependent rows in other services are removed
/// asynchronously by their cascade handlers.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the user does not exist.
pub async fn handle_delete_user(
    command: &DeleteUser,
    store: &dyn EntityStore<User>,
    publisher: &Publisher,
) -> Result<User, DomainError> {
    let user = store
        .delete(command.user_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::User,
            id: command.user_id,
        })?;
    info!(user_id = user.user_id, correlation_id = %command.correlation_id, "user deleted");

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::USER_DELETED, &user),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(user)
}
