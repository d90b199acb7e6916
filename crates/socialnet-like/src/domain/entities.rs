//! Entities owned by the Like service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};

/// A user's like on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostLike {
    /// Store-assigned identifier.
    pub like_id: i64,
    /// Liked post.
    pub post_id: i64,
    /// Liking user.
    pub user_id: i64,
    /// When the like was given.
    pub created_at: DateTime<Utc>,
}

impl Entity for PostLike {
    const KIND: EntityKind = EntityKind::PostLike;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::PostId];
    const UNIQUE_OWNERS: &'static [OwnerField] = Self::OWNER_FIELDS;

    fn id(&self) -> i64 {
        self.like_id
    }

    fn with_id(self, like_id: i64) -> Self {
        Self { like_id, ..self }
    }

    fn owner_id(&self, field: OwnerField) -> Option<i64> {
        match field {
            OwnerField::UserId => Some(self.user_id),
            OwnerField::PostId => Some(self.post_id),
            _ => None,
        }
    }

    fn partition_key(&self) -> i64 {
        self.post_id
    }
}

/// A user's like on a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentLike {
    /// Store-assigned identifier.
    pub like_id: i64,
    /// Liked comment.
    pub comment_id: i64,
    /// Liking user.
    pub user_id: i64,
    /// When the like was given.
    pub created_at: DateTime<Utc>,
}

impl Entity for CommentLike {
    const KIND: EntityKind = EntityKind::CommentLike;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::CommentId];
    const UNIQUE_OWNERS: &'static [OwnerField] = Self::OWNER_FIELDS;

    fn id(&self) -> i64 {
        self.like_id
    }

    fn with_id(self, like_id: i64) -> Self {
        Self { like_id, ..self }
    }

    fn owner_id(&self, field: OwnerField) -> Option<i64> {
        match field {
            OwnerField::UserId => Some(self.user_id),
            OwnerField::CommentId => Some(self.comment_id),
            _ => None,
        }
    }

    fn partition_key(&self) -> i64 {
        self.comment_id
    }
}
