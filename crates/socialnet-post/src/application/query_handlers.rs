//! Query handlers for the Post service.

use socialnet_core::entity::{EntityKind, OwnerField};
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;

use crate::domain::entities::Post;

/// Retrieves a post by id.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no such post exists.
pub async fn get_post_by_id(post_id: i64, store: &dyn EntityStore<Post>) -> Result<Post, DomainError> {
    store.find(post_id).await?.ok_or(DomainError::NotFound {
        kind: EntityKind::Post,
        id: post_id,
    })
}

/// Whether a post exists.
///
/// # Errors
///
/// Returns the store's error.
pub async fn post_exists(post_id: i64, store: &dyn EntityStore<Post>) -> Result<bool, DomainError> {
    store.exists(post_id).await
}

/// Number of posts authored by `user_id`.
///
/// # Errors
///
/// Returns the store's error.
pub async fn count_posts_by_user(
    user_id: i64,
    store: &dyn EntityStore<Post>,
) -> Result<u64, DomainError> {
    store.count_by_owner(OwnerField::UserId, user_id).await
}

#[cfg(test)]
mod tests {
    use socialnet_store::InMemoryEntityStore;
    use socialnet_test_support::FixedClock;

    use super::*;

    fn post(user_id: i64) -> Post {
        let now = FixedClock::default().0;
        Post {
            post_id: 0,
            user_id,
            title: "t".into(),
            body: "b".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_count_posts_by_user_only_counts_that_author() {
        // Arrange
        let store = InMemoryEntityStore::<Post>::new();
        for user_id in [7, 7, 8] {
            store.insert(post(user_id)).await.unwrap();
        }

        // Act
        let count = count_posts_by_user(7, &store).await.unwrap();

        // Assert
        assert_eq!(count, 2);
        assert_eq!(count_posts_by_user(9, &store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_post_by_id_and_exists() {
        let store = InMemoryEntityStore::<Post>::new();
        let stored = store.insert(post(7)).await.unwrap();

        assert_eq!(get_post_by_id(stored.post_id, &store).await.unwrap(), stored);
        assert!(post_exists(stored.post_id, &store).await.unwrap());
        assert!(!post_exists(stored.post_id + 1, &store).await.unwrap());
        assert!(matches!(
            get_post_by_id(42, &store).await,
            Err(DomainError::NotFound { id: 42, .. })
        ));
    }
}
