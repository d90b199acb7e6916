//! Command handlers for the Notification service.

use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;
use tracing::info;

use crate::domain::commands::DeleteNotification;
use crate::domain::entities::Notification;

/// Handles the `DeleteNotification` command. Notifications are leaves of
/// the cascade graph, so nothing is published.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the notification does not exist.
pub async fn handle_delete_notification(
    command: &DeleteNotification,
    store: &dyn EntityStore<Notification>,
) -> Result<Notification, DomainError> {
    let notification = store
        .delete(command.notification_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::Notification,
            id: command.notification_id,
        })?;
    info!(
        notification_id = notification.notification_id,
        correlation_id = %command.correlation_id,
        "notification deleted"
    );
    Ok(notification)
}
