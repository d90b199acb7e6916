//! Command handlers for the Post service.

use socialnet_core::channel::names;
use socialnet_core::clock::Clock;
use socialnet_core::entity::EntityKind;
use socialnet_core::error::DomainError;
use socialnet_core::event::{EntityEvent, EventContext};
use socialnet_core::store::EntityStore;
use socialnet_propagation::{CrossServiceValidator, Publisher, Reference};
use tracing::info;

use crate::domain::commands::{CreatePost, DeletePost};
use crate::domain::entities::Post;

/// Handles the `CreatePost` command. The author is checked against the user
/// service before anything is written.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty title,
/// `DomainError::ReferenceNotFound` if the author does not exist, or
/// `DomainError::ReferenceCheckFailed` if the user service cannot answer.
pub async fn handle_create_post(
    command: &CreatePost,
    clock: &dyn Clock,
    store: &dyn EntityStore<Post>,
    validator: &CrossServiceValidator,
) -> Result<Post, DomainError> {
    let title = command.title.trim();
    if title.is_empty() {
        return Err(DomainError::Validation("title must not be empty".into()));
    }
    validator
        .require(Reference::new(EntityKind::User, command.user_id))
        .await?;

    let now = clock.now();
    let post = store
        .insert(Post {
            post_id: 0,
            user_id: command.user_id,
            title: title.to_owned(),
            body: command.body.clone(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(
        post_id = post.post_id,
        user_id = post.user_id,
        correlation_id = %command.correlation_id,
        "post created"
    );
    Ok(post)
}

/// Handles the `DeletePost` command and publishes `post.deleted`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the post does not exist.
pub async fn handle_delete_post(
    command: &DeletePost,
    store: &dyn EntityStore<Post>,
    publisher: &Publisher,
) -> Result<Post, DomainError> {
    let post = store
        .delete(command.post_id)
        .await?
        .ok_or(DomainError::NotFound {
            kind: EntityKind::Post,
            id: command.post_id,
        })?;
    info!(post_id = post.post_id, correlation_id = %command.correlation_id, "post deleted");

    publisher
        .publish_after_commit(
            &EntityEvent::new(names::POST_DELETED, &post),
            EventContext::new(command.correlation_id),
        )
        .await;
    Ok(post)
}
