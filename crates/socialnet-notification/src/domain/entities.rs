//! Entities owned by the Notification service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone started following the recipient.
    Follow,
}

/// A notification delivered to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Store-assigned identifier.
    pub notification_id: i64,
    /// Recipient.
    pub user_id: i64,
    /// User whose action caused the notification.
    pub actor_id: i64,
    /// Kind of notification.
    pub kind: NotificationKind,
    /// Id of the entity that caused it (the subscription for `Follow`).
    pub source_id: i64,
    /// Whether the recipient has seen it.
    #[serde(default)]
    pub read: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Entity for Notification {
    const KIND: EntityKind = EntityKind::Notification;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::ActorId];

    fn id(&self) -> i64 {
        self.notification_id
    }

    fn with_id(self, notification_id: i64) -> Self {
        Self {
            notification_id,
            ..self
        }
    }

    fn owner_id(&self, field: OwnerField) -> Option<i64> {
        match field {
            OwnerField::UserId => Some(self.user_id),
            OwnerField::ActorId => Some(self.actor_id),
            _ => None,
        }
    }

    fn partition_key(&self) -> i64 {
        self.user_id
    }
}
