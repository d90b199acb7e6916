//! Query handlers for the Comment service.

use socialnet_core::entity::{EntityKind, OwnerField};
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;

use crate::domain::entities::Comment;

/// Retrieves a comment by id.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no such comment exists.
pub async fn get_comment_by_id(
    comment_id: i64,
    store: &dyn EntityStore<Comment>,
) -> Result<Comment, DomainError> {
    store.find(comment_id).await?.ok_or(DomainError::NotFound {
        kind: EntityKind::Comment,
        id: comment_id,
    })
}

/// Whether a comment exists.
///
/// # Errors
///
/// Returns the store's error.
pub async fn comment_exists(
    comment_id: i64,
    store: &dyn EntityStore<Comment>,
) -> Result<bool, DomainError> {
    store.exists(comment_id).await
}

/// Comments on a post, oldest first.
///
/// # Errors
///
/// Returns the store's error.
pub async fn list_comments_by_post(
    post_id: i64,
    store: &dyn EntityStore<Comment>,
) -> Result<Vec<Comment>, DomainError> {
    store.find_by_owner(OwnerField::PostId, post_id).await
}

/// Number of comments on a post.
///
/// # Errors
///
/// Returns the store's error.
pub async fn count_comments_by_post(
    post_id: i64,
    store: &dyn EntityStore<Comment>,
) -> Result<u64, DomainError> {
    store.count_by_owner(OwnerField::PostId, post_id).await
}

#[cfg(test)]
mod tests {
    use socialnet_store::InMemoryEntityStore;
    use socialnet_test_support::FixedClock;

    use super::*;

    #[tokio::test]
    async fn test_counts_and_lists_comments_per_post() {
        // Arrange
        let store = InMemoryEntityStore::<Comment>::new();
        let now = FixedClock::default().0;
        for (post_id, user_id) in [(1, 7), (1, 8), (2, 7)] {
            store
                .insert(Comment {
                    comment_id: 0,
                    post_id,
                    user_id,
                    body: "hi".into(),
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }

        // Act
        let count = count_comments_by_post(1, &store).await.unwrap();
        let listed = list_comments_by_post(1, &store).await.unwrap();

        // Assert
        assert_eq!(count, 2);
        assert_eq!(
            listed.iter().map(|c| c.user_id).collect::<Vec<_>>(),
            vec![7, 8]
        );
        assert!(comment_exists(3, &store).await.unwrap());
        assert!(matches!(
            get_comment_by_id(4, &store).await,
            Err(DomainError::NotFound { id: 4, .. })
        ));
    }
}
