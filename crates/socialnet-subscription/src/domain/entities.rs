//! Entities owned by the Subscription service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};

/// `follower_id` follows `followee_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Store-assigned identifier.
    pub subscription_id: i64,
    /// The following user.
    pub follower_id: i64,
    /// The followed user.
    pub followee_id: i64,
    /// When the follow started.
    pub created_at: DateTime<Utc>,
}

impl Entity for Subscription {
    const KIND: EntityKind = EntityKind::Subscription;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::FollowerId, OwnerField::FolloweeId];
    const UNIQUE_OWNERS: &'static [OwnerField] = Self::OWNER_FIELDS;

    fn id(&self) -> i64 {
        self.subscription_id
    }

    fn with_id(self, subscription_id: i64) -> Self {
        Self {
            subscription_id,
            ..self
        }
    }

    fn owner_id(&self, field: OwnerField) -> Option<i64> {
        match field {
            OwnerField::FollowerId => Some(self.follower_id),
            OwnerField::FolloweeId => Some(self.followee_id),
            _ => None,
        }
    }

    fn partition_key(&self) -> i64 {
        self.follower_id
    }
}
