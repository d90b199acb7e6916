//! Domain event abstractions and the envelope carried on channels.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::entity::Entity;

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// The channel this event is published on.
    fn channel(&self) -> &str;

    /// Partition key: the owning entity id, so events for one owner stay
    /// ordered relative to each other.
    fn partition_key(&self) -> String;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;
}

/// Tracing identifiers threaded from a command (or a triggering event) into
/// the events it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    /// Correlation ID shared by everything caused by one user action.
    pub correlation_id: Uuid,
    /// Event that directly caused this one, if any.
    pub causation_id: Option<Uuid>,
}

impl EventContext {
    /// Context for an event produced directly by a command.
    #[must_use]
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            causation_id: None,
        }
    }

    /// Context for a follow-on event caused by `trigger`.
    #[must_use]
    pub fn caused_by(trigger: &EventEnvelope) -> Self {
        Self {
            correlation_id: trigger.correlation_id,
            causation_id: Some(trigger.event_id),
        }
    }
}

/// A published event: what travels on a channel.
///
/// The payload is opaque JSON; consumers read the fields they need and
/// ignore the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Channel (topic) name.
    pub channel: String,
    /// Partition key.
    pub partition_key: String,
    /// Event payload.
    pub payload: serde_json::Value,
    /// Transport headers; dead-letter metadata lives here.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Correlation ID for tracing an action through its effects.
    pub correlation_id: Uuid,
    /// The event that caused this one.
    #[serde(default)]
    pub causation_id: Option<Uuid>,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Wraps a domain event for publishing.
    #[must_use]
    pub fn new(event: &dyn DomainEvent, context: EventContext, clock: &dyn Clock) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            channel: event.channel().to_owned(),
            partition_key: event.partition_key(),
            payload: event.to_payload(),
            headers: BTreeMap::new(),
            correlation_id: context.correlation_id,
            causation_id: context.causation_id,
            occurred_at: clock.now(),
        }
    }

    /// Reads an integer field from the payload.
    #[must_use]
    pub fn payload_i64(&self, field: &str) -> Option<i64> {
        self.payload.get(field).and_then(serde_json::Value::as_i64)
    }
}

/// An entity snapshot published on a channel.
///
/// Create, update and delete events all carry the full row so consumers see
/// the owner ids and timestamps without calling back.
#[derive(Debug)]
pub struct EntityEvent<'a, E: Entity> {
    channel: &'a str,
    entity: &'a E,
}

impl<'a, E: Entity> EntityEvent<'a, E> {
    /// Creates an event for `entity` on `channel`.
    #[must_use]
    pub fn new(channel: &'a str, entity: &'a E) -> Self {
        Self { channel, entity }
    }
}

impl<E: Entity> DomainEvent for EntityEvent<'_, E> {
    fn channel(&self) -> &str {
        self.channel
    }

    fn partition_key(&self) -> String {
        self.entity.partition_key().to_string()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Entities are plain data structs; serializing them cannot fail.
        serde_json::to_value(self.entity).unwrap_or(serde_json::Value::Null)
    }
}
