//! Query handlers for the User service.

use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;

use crate::domain::entities::User;

/// Retrieves a user by id.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no such user exists.
pub async fn get_user_by_id(
    user_id: i64,
    store: &dyn EntityStore<User>,
) -> Result<User, DomainError> {
    store.find(user_id).await?.ok_or(DomainError::NotFound {
        kind: EntityKind::User,
        id: user_id,
    })
}

/// Whether a user exists; answers other services' existence checks.
///
/// # Errors
///
/// Returns the store's error.
pub async fn user_exists(user_id: i64, store: &dyn EntityStore<User>) -> Result<bool, DomainError> {
    store.exists(user_id).await
}
