//! The cascade-delete graph.
//!
//! Deleting an entity fans out across services: every edge says "when an
//! entity of kind `owner` is deleted, delete the `target` rows whose `field`
//! references it". Targets that are themselves owners emit their own
//! deletion events per row, which is how a user deletion reaches the likes
//! on comments under that user's posts.

use crate::channel::names;
use crate::entity::{EntityKind, OwnerField};

/// One "on delete, also delete" relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeEdge {
    /// Kind whose deletion triggers the cascade.
    pub owner: EntityKind,
    /// Kind of the dependent rows.
    pub target: EntityKind,
    /// Column on the dependent rows that references the owner.
    pub field: OwnerField,
}

impl CascadeEdge {
    const fn new(owner: EntityKind, target: EntityKind, field: OwnerField) -> Self {
        Self {
            owner,
            target,
            field,
        }
    }

    /// Channel the cascade listens on.
    #[must_use]
    pub fn trigger(&self) -> &'static str {
        // Every owner in the graph has a deletion channel; checked by tests.
        deletion_channel(self.owner).unwrap_or(names::USER_DELETED)
    }

    /// Payload field of the trigger event that carries the owner id.
    #[must_use]
    pub const fn trigger_key(&self) -> &'static str {
        self.owner.id_field()
    }

    /// Channel for the per-row deletion events this cascade emits, if any.
    #[must_use]
    pub fn follow_on(&self) -> Option<&'static str> {
        deletion_channel(self.target)
    }

    /// Consumer group the cascade reads the trigger channel with.
    #[must_use]
    pub fn group(&self) -> String {
        format!(
            "{}.{}-by-{}",
            self.target.service(),
            self.target.as_str(),
            self.field.column()
        )
    }
}

/// Deletion channel of `kind`, if deletions of that kind are published.
#[must_use]
pub const fn deletion_channel(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::User => Some(names::USER_DELETED),
        EntityKind::Post => Some(names::POST_DELETED),
        EntityKind::Comment => Some(names::COMMENT_DELETED),
        EntityKind::PostLike => Some(names::POST_LIKE_DELETED),
        EntityKind::CommentLike => Some(names::COMMENT_LIKE_DELETED),
        EntityKind::Media => Some(names::MEDIA_DELETED),
        EntityKind::Subscription => Some(names::SUBSCRIPTION_DELETED),
        EntityKind::Notification => None,
    }
}

/// The full cascade graph, as an adjacency list keyed by owner.
pub const CASCADE_GRAPH: &[CascadeEdge] = &[
    // user → everything a user owns
    CascadeEdge::new(EntityKind::User, EntityKind::Post, OwnerField::UserId),
    CascadeEdge::new(EntityKind::User, EntityKind::Comment, OwnerField::UserId),
    CascadeEdge::new(EntityKind::User, EntityKind::PostLike, OwnerField::UserId),
    CascadeEdge::new(EntityKind::User, EntityKind::CommentLike, OwnerField::UserId),
    CascadeEdge::new(EntityKind::User, EntityKind::Media, OwnerField::UserId),
    CascadeEdge::new(EntityKind::User, EntityKind::Notification, OwnerField::UserId),
    CascadeEdge::new(EntityKind::User, EntityKind::Notification, OwnerField::ActorId),
    CascadeEdge::new(EntityKind::User, EntityKind::Subscription, OwnerField::FollowerId),
    CascadeEdge::new(EntityKind::User, EntityKind::Subscription, OwnerField::FolloweeId),
    // post → its comments, likes and attached media
    CascadeEdge::new(EntityKind::Post, EntityKind::Comment, OwnerField::PostId),
    CascadeEdge::new(EntityKind::Post, EntityKind::PostLike, OwnerField::PostId),
    CascadeEdge::new(EntityKind::Post, EntityKind::Media, OwnerField::PostId),
    // comment → its likes
    CascadeEdge::new(EntityKind::Comment, EntityKind::CommentLike, OwnerField::CommentId),
];

/// Edges triggered by deletions of `owner`.
pub fn edges_from(owner: EntityKind) -> impl Iterator<Item = &'static CascadeEdge> {
    CASCADE_GRAPH.iter().filter(move |edge| edge.owner == owner)
}

/// Edges whose dependent rows are of kind `target`.
pub fn edges_into(target: EntityKind) -> impl Iterator<Item = &'static CascadeEdge> {
    CASCADE_GRAPH.iter().filter(move |edge| edge.target == target)
}
