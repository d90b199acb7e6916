//! Event channel contract: named, partitioned, append-only logs read by
//! consumer groups.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::EventEnvelope;

/// Channel names published by the services.
pub mod names {
    /// A user was deleted.
    pub const USER_DELETED: &str = "user.deleted";
    /// A post was deleted.
    pub const POST_DELETED: &str = "post.deleted";
    /// A comment was created.
    pub const COMMENT_CREATED: &str = "comment.created";
    /// A comment was updated.
    pub const COMMENT_UPDATED: &str = "comment.updated";
    /// A comment was deleted.
    pub const COMMENT_DELETED: &str = "comment.deleted";
    /// A post was liked.
    pub const POST_LIKE_CREATED: &str = "like.post.created";
    /// A post like was removed.
    pub const POST_LIKE_DELETED: &str = "like.post.deleted";
    /// A comment was liked.
    pub const COMMENT_LIKE_CREATED: &str = "like.comment.created";
    /// A comment like was removed.
    pub const COMMENT_LIKE_DELETED: &str = "like.comment.deleted";
    /// A media object was uploaded.
    pub const MEDIA_UPLOADED: &str = "media.upload";
    /// A media object was deleted.
    pub const MEDIA_DELETED: &str = "media.deleted";
    /// A user followed another user.
    pub const SUBSCRIPTION_CREATED: &str = "subscription.created";
    /// A follow was removed.
    pub const SUBSCRIPTION_DELETED: &str = "subscription.deleted";

    /// Every channel the system declares at startup.
    pub const ALL: [&str; 13] = [
        USER_DELETED,
        POST_DELETED,
        COMMENT_CREATED,
        COMMENT_UPDATED,
        COMMENT_DELETED,
        POST_LIKE_CREATED,
        POST_LIKE_DELETED,
        COMMENT_LIKE_CREATED,
        COMMENT_LIKE_DELETED,
        MEDIA_UPLOADED,
        MEDIA_DELETED,
        SUBSCRIPTION_CREATED,
        SUBSCRIPTION_DELETED,
    ];
}

/// Partition count every channel is declared with.
pub const DEFAULT_PARTITIONS: u32 = 3;

/// Replication factor every channel is declared with.
pub const DEFAULT_REPLICATION_FACTOR: u16 = 1;

/// Suffix of dead-letter channels.
pub const DEAD_LETTER_SUFFIX: &str = ".DLT";

/// Returns the dead-letter channel for `channel`.
#[must_use]
pub fn dead_letter_channel(channel: &str) -> String {
    format!("{channel}{DEAD_LETTER_SUFFIX}")
}

/// Declaration of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Channel name.
    pub name: String,
    /// Number of partitions.
    pub partitions: u32,
    /// Replication factor.
    pub replication_factor: u16,
}

impl ChannelSpec {
    /// A channel with the system-wide partition count and replication factor.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: DEFAULT_PARTITIONS,
            replication_factor: DEFAULT_REPLICATION_FACTOR,
        }
    }

    /// Specs for every system channel.
    #[must_use]
    pub fn system() -> Vec<Self> {
        names::ALL.iter().map(|name| Self::new(*name)).collect()
    }
}

/// Where a published record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPosition {
    /// Partition index.
    pub partition: u32,
    /// Offset within the partition.
    pub offset: u64,
}

/// A record delivered to a consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Partition the record was read from.
    pub partition: u32,
    /// Offset of the record within its partition.
    pub offset: u64,
    /// The published envelope.
    pub envelope: EventEnvelope,
}

impl Message {
    /// Channel the record was read from.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.envelope.channel
    }
}

/// Channel-level failures. All of them are transient from the caller's
/// point of view and should be retried.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Publishing to or subscribing on a channel that was never declared.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// The broker could not be reached.
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    /// The channel has been shut down.
    #[error("channel closed")]
    Closed,
}

/// Publish/subscribe over partitioned logs.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Declares a channel (and its dead-letter channel). Declaring an
    /// existing channel is a no-op.
    async fn declare(&self, spec: &ChannelSpec) -> Result<(), ChannelError>;

    /// Appends an envelope to `envelope.channel`, routed by its partition key.
    async fn publish(&self, envelope: &EventEnvelope) -> Result<RecordPosition, ChannelError>;

    /// Joins `group` on `channel`, returning one reader per partition this
    /// member claimed. Each group receives every message at least once.
    async fn subscribe(
        &self,
        channel: &str,
        group: &str,
    ) -> Result<Vec<Box<dyn PartitionReader>>, ChannelError>;
}

/// Sequential reader over one claimed partition.
#[async_trait]
pub trait PartitionReader: Send {
    /// Channel being read.
    fn channel(&self) -> &str;

    /// Partition being read.
    fn partition(&self) -> u32;

    /// Waits for the next record. `None` means the channel was closed.
    async fn next_message(&mut self) -> Result<Option<Message>, ChannelError>;

    /// Marks `message` and everything before it as processed for the group.
    async fn commit(&mut self, message: &Message) -> Result<(), ChannelError>;
}
