//! Command handlers for the Like service.

use socialnet_core::channel::names;
use socialnet_core::clock::Clock;
use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::event::{EntityEvent, EventContext};
use socialnet_core::store::EntityStore;
use socialnet_propagation::{CrossServiceValidator, Publisher, Reference};
use tracing::info;

use crate::domain::commands::{LikeComment, LikePost, UnlikeComment, UnlikePost};
use crate::domain::entities::{CommentLike, PostLike};

/// The store rejects a second like for the same user and target.
fn already_liked(err: DomainError, message: String) -> DomainError {
    match err {
        DomainError::Conflict(_) => DomainError::Conflict(message),
        other => other,
    }
}

/// Handles the `LikePost` command and publishes `like.post.created`.
///
/// # Errors
///
/// Returns the validator's reference errors, or `DomainError::Conflict` if
/// the user already likes the post.
pub async fn handle_like_post(
    command: &LikePost,
    clock: &dyn Clock,
    store: &dyn EntityStore<PostLike>,
    validator: &CrossServiceValidator,
    publisher: &Publisher,
) -> Result<PostLike, DomainError> {
    validator
        .require_all(&[
            Reference::new(EntityKind::Post, command.post_id),
            Reference::new(EntityKind::User, command.user_id),
        ])
        .await?;

    let like = store
        .insert(PostLike {
            like_id: 0,
            post_id: command.post_id,
            user_id: command.user_id,
            created_at: clock.now(),
        })
        .await
        .map_err(|err| {
            already_liked(
                err,
                format!("user {} already likes post {}", command.user_id, command.post_id),
            )
        })?;
    info!(like_id = like.like_id, post_id = like.post_id, correlation_id = %command.correlation_id, "post liked");

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::POST_LIKE_CREATED, &like),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(like)
}

/// Handles the `UnlikePost` command and publishes `like.post.deleted`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the like does not exist.
pub async fn handle_unlike_post(
    command: &UnlikePost,
    store: &dyn EntityStore<PostLike>,
    publisher: &Publisher,
) -> Result<PostLike, DomainError> {
    let like = store
        .delete(command.like_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::PostLike,
            id: command.like_id,
        })?;
    info!(like_id = like.like_id, correlation_id = %command.correlation_id, "post like removed");

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::POST_LIKE_DELETED, &like),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(like)
}

/// Handles the `LikeComment` command and publishes `like.comment.created`.
///
/// # Errors
///
/// Returns the validator's reference errors, or `DomainError::Conflict` if
/// the user already likes the comment.
pub async fn handle_like_comment(
    command: &LikeComment,
    clock: &dyn Clock,
    store: &dyn EntityStore<CommentLike>,
    validator: &CrossServiceValidator,
    publisher: &Publisher,
) -> Result<CommentLike, DomainError> {
    validator
        .require_all(&[
            Reference::new(EntityKind::Comment, command.comment_id),
            Reference::new(EntityKind::User, command.user_id),
        ])
        .await?;

    let like = store
        .insert(CommentLike {
            like_id: 0,
            comment_id: command.comment_id,
            user_id: command.user_id,
            created_at: clock.now(),
        })
        .await
        .map_err(|err| {
            already_liked(
                err,
                format!("user {} already likes comment {}", command.user_id, command.comment_id),
            )
        })?;
    info!(
        like_id = like.like_id,
        comment_id = like.comment_id,
        correlation_id = %command.correlation_id,
        "comment liked"
    );

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::COMMENT_LIKE_CREATED, &like),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(like)
}

/// Handles the `UnlikeComment` command and publishes `like.comment.deleted`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the like does not exist.
pub async fn handle_unlike_comment(
    command: &UnlikeComment,
    store: &dyn EntityStore<CommentLike>,
    publisher: &Publisher,
) -> Result<CommentLike, DomainError> {
    let like = store
        .delete(command.like_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::CommentLike,
            id: command.like_id,
        })?;
    info!(like_id = like.like_id, correlation_id = %command.correlation_id, "comment like removed");

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::COMMENT_LIKE_DELETED, &like),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(like)
}
