//! Entities owned by the Comment service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Store-assigned identifier.
    pub comment_id: i64,
    /// Parent post.
    pub post_id: i64,
    /// Author.
    pub user_id: i64,
    /// Comment text.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
}

impl Entity for Comment {
    const KIND: EntityKind = EntityKind::Comment;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::PostId];

    fn id(&self) -> i64 {
        self.comment_id
    }

    fn with_id(self, comment_id: i64) -> Self {
        Self { comment_id, ..self }
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
