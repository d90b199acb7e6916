//! Command handlers for the Comment service.

use socialnet_core::channel::names;
use socialnet_core::clock::Clock;
use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::event::{EntityEvent, EventContext};
use socialnet_core::store::EntityStore;
use socialnet_propagation::{CrossServiceValidator, Publisher, Reference};
use tracing::info;

use crate::domain::commands::{CreateComment, DeleteComment, UpdateComment};
use crate::domain::entities::Comment;

fn require_body(body: &str) -> Result<&str, DomainError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(DomainError::Validation("comment body must not be empty".into()));
    }
    Ok(body)
}

/// Handles the `CreateComment` command.
///
/// The post and the author are both verified with their owning services
/// first; a missing or unverifiable reference rejects the command with
/// nothing written and nothing published.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty body, or the validator's
/// `ReferenceNotFound` / `ReferenceCheckFailed`.
pub async fn handle_create_comment(
    command: &CreateComment,
    clock: &dyn Clock,
    store: &dyn EntityStore<Comment>,
    validator: &CrossServiceValidator,
    publisher: &Publisher,
) -> Result<Comment, DomainError> {
    let body = require_body(&command.body)?;
    validator
        .require_all(&[
            Reference::new(EntityKind::Post, command.post_id),
            Reference::new(EntityKind::User, command.user_id),
        ])
        .await?;

    let now = clock.now();
    let comment = store
        .insert(Comment {
            comment_id: 0,
            post_id: command.post_id,
            user_id: command.user_id,
            body: body.to_owned(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(
        comment_id = comment.comment_id,
        post_id = comment.post_id,
        correlation_id = %command.correlation_id,
        "comment created"
    );

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::COMMENT_CREATED, &comment),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(comment)
}

/// Handles the `UpdateComment` command and publishes `comment.updated`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the comment does not exist or
/// `DomainError::Validation` for an empty body.
pub async fn handle_update_comment(
    command: &UpdateComment,
    clock: &dyn Clock,
    store: &dyn EntityStore<Comment>,
    publisher: &Publisher,
) -> Result<Comment, DomainError> {
    let body = require_body(&command.body)?;
    let existing = store
        .find(command.comment_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::Comment,
            id: command.comment_id,
        })?;

    let comment = store
        .update(Comment {
            body: body.to_owned(),
            updated_at: clock.now(),
            ..existing
        })
        .await?;
    info!(comment_id = comment.comment_id, correlation_id = %command.correlation_id, "comment updated");

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::COMMENT_UPDATED, &comment),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(comment)
}

/// Handles the `DeleteComment` command and publishes `comment.deleted`,
/// which removes the comment's likes.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the comment does not exist.
pub async fn handle_delete_comment(
    command: &DeleteComment,
    store: &dyn EntityStore<Comment>,
    publisher: &Publisher,
) -> Result<Comment, DomainError> {
    let comment = store
        .delete(command.comment_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::Comment,
            id: command.comment_id,
        })?;
    info!(comment_id = comment.comment_id, correlation_id = %command.correlation_id, "comment deleted");

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::COMMENT_DELETED, &comment),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(comment)
}
