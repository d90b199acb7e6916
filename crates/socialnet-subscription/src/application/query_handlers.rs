//! Query handlers for the Subscription service.

use socialnet_core::entity::OwnerField;
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;

use crate::domain::entities::Subscription;

/// Number of users following `user_id`.
///
/// # Errors
///
/// Returns the store's error.
pub async fn follower_count(
    user_id: i64,
    store: &dyn EntityStore<Subscription>,
) -> Result<u64, DomainError> {
    store.count_by_owner(OwnerField::FolloweeId, user_id).await
}
