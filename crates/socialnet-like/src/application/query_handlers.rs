//! Query handlers for the Like service: the derived like counts.

use socialnet_core::entity::OwnerField;
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;

use crate::domain::entities::{CommentLike, PostLike};

/// Number of likes on a post.
///
/// # Errors
///
/// Returns the store's error.
pub async fn count_post_likes(
    post_id: i64,
    store: &dyn EntityStore<PostLike>,
) -> Result<u64, DomainError> {
    store.count_by_owner(OwnerField::PostId, post_id).await
}

/// Number of likes on a comment.
///
/// # Errors
///
/// Returns the store's error.
pub async fn count_comment_likes(
    comment_id: i64,
    store: &dyn EntityStore<CommentLike>,
) -> Result<u64, DomainError> {
    store.count_by_owner(OwnerField::CommentId, comment_id).await
}
