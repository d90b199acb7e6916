//! Shared fixtures for propagation integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use socialnet_channel::InMemoryChannel;
use socialnet_core::channel::{EventChannel, Message};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};
use socialnet_core::event::EventEnvelope;
use socialnet_propagation::Publisher;
use socialnet_test_support::FixedClock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: i64,
    pub user_id: i64,
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

    fn partition_key(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: i64,
    pub post_id: i64,
    pub user_id: i64,
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentLike {
    pub like_id: i64,
    pub comment_id: i64,
    pub user_id: i64,
}

impl Entity for CommentLike {
    const KIND: EntityKind = EntityKind::CommentLike;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::CommentId];

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

/// An envelope as it would arrive from `channel`.
pub fn envelope(channel: &str, key: i64, payload: serde_json::Value) -> EventEnvelope {
    EventEnvelope {
        event_id: Uuid::now_v7(),
        channel: channel.to_owned(),
        partition_key: key.to_string(),
        payload,
        headers: BTreeMap::new(),
        correlation_id: Uuid::new_v4(),
        causation_id: None,
        occurred_at: FixedClock::default().0,
    }
}

/// A message read from partition 0 at offset 0.
pub fn message(envelope: EventEnvelope) -> Message {
    Message {
        partition: 0,
        offset: 0,
        envelope,
    }
}

/// Publisher over `channel` with a fixed clock.
pub fn publisher(channel: Arc<dyn EventChannel>) -> Publisher {
    Publisher::new(channel, Arc::new(FixedClock::default()))
}

/// A fresh channel with every system channel declared.
pub fn system_channel() -> InMemoryChannel {
    InMemoryChannel::with_system_channels()
}
