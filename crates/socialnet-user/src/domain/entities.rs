//! Entities owned by the User service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};

/// A platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier.
    pub user_id: i64,
    /// Display handle.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    const OWNER_FIELDS: &'static [OwnerField] = &[];

    fn id(&self) -> i64 {
        self.user_id
    }

    fn with_id(self, user_id: i64) -> Self {
        Self { user_id, ..self }
    }

    fn owner_id(&self, _field: OwnerField) -> Option<i64> {
        None
    }

    fn partition_key(&self) -> i64 {
        self.user_id
    }
}
