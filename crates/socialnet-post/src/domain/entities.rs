//! Entities owned by the Post service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};

/// A post authored by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Store-assigned identifier.
    pub post_id: i64,
    /// Author; lives in the user service.
    pub user_id: i64,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId];

    fn id(&self) -> i64 {
        self.post_id
    }

    fn with_id(self, post_id: i64) -> Self {
        Self { post_id, ..self }
    }

    fn owner_id(&self, field: OwnerField) -> Option<i64> {
        (field == OwnerField::UserId).then_some(self.user_id)
    }

    /// Post events are keyed by author so one user's posts stay ordered.
    fn partition_key(&self) -> i64 {
        self.user_id
    }
}
