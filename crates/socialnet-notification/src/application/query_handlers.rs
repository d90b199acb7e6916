//! Query handlers for the Notification service.

use socialnet_core::entity::OwnerField;
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;

use crate::domain::entities::Notification;

/// Notifications addressed to `user_id`, oldest first.
///
/// # Errors
///
/// Returns the store's error.
pub async fn list_notifications_for_user(
    user_id: i64,
    store: &dyn EntityStore<Notification>,
) -> Result<Vec<Notification>, DomainError> {
    store.find_by_owner(OwnerField::UserId, user_id).await
}
