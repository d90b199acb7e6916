//! Entity kinds, owner references and the `Entity` trait shared by every
//! service-owned row.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// The kinds of entity owned by the individual services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// A platform user (user service).
    User,
    /// A post authored by a user (post service).
    Post,
    /// A comment on a post (comment service).
    Comment,
    /// A like on a post (like service).
    PostLike,
    /// A like on a comment (like service).
    CommentLike,
    /// An uploaded media object (media service).
    Media,
    /// A notification delivered to a user (notification service).
    Notification,
    /// A follower relationship between two users (subscription service).
    Subscription,
}

impl EntityKind {
    /// Every kind, in cascade order (roots first).
    pub const ALL: [EntityKind; 8] = [
        EntityKind::User,
        EntityKind::Post,
        EntityKind::Comment,
        EntityKind::PostLike,
        EntityKind::CommentLike,
        EntityKind::Media,
        EntityKind::Notification,
        EntityKind::Subscription,
    ];

    /// Stable lowercase name used in logs, error codes and group names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::PostLike => "post-like",
            Self::CommentLike => "comment-like",
            Self::Media => "media",
            Self::Notification => "notification",
            Self::Subscription => "subscription",
        }
    }

    /// Payload field holding the id of an entity of this kind.
    #[must_use]
    pub const fn id_field(self) -> &'static str {
        match self {
            Self::User => "user_id",
            Self::Post => "post_id",
            Self::Comment => "comment_id",
            Self::PostLike | Self::CommentLike => "like_id",
            Self::Media => "media_id",
            Self::Notification => "notification_id",
            Self::Subscription => "subscription_id",
        }
    }

    /// Name of the service that owns rows of this kind.
    #[must_use]
    pub const fn service(self) -> &'static str {
        match self {
            Self::User => "user-service",
            Self::Post => "post-service",
            Self::Comment => "comment-service",
            Self::PostLike | Self::CommentLike => "like-service",
            Self::Media => "media-service",
            Self::Notification => "notification-service",
            Self::Subscription => "subscription-service",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column on an owned row that references an entity living in another
/// service. These references are never enforced by a database constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerField {
    /// Author / owner user.
    UserId,
    /// Parent post.
    PostId,
    /// Parent comment.
    CommentId,
    /// User who triggered a notification.
    ActorId,
    /// Following user of a subscription.
    FollowerId,
    /// Followed user of a subscription.
    FolloweeId,
}

impl OwnerField {
    /// Column and payload field name.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::PostId => "post_id",
            Self::CommentId => "comment_id",
            Self::ActorId => "actor_id",
            Self::FollowerId => "follower_id",
            Self::FolloweeId => "followee_id",
        }
    }

    /// The entity kind this field points at.
    #[must_use]
    pub const fn references(self) -> EntityKind {
        match self {
            Self::UserId | Self::ActorId | Self::FollowerId | Self::FolloweeId => EntityKind::User,
            Self::PostId => EntityKind::Post,
            Self::CommentId => EntityKind::Comment,
        }
    }
}

impl fmt::Display for OwnerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A row owned by exactly one service.
///
/// The serialized form is the snapshot carried in event payloads, so it
/// names its own id with a kind-specific field (`post_id`, `comment_id`, ...)
/// rather than a bare `id`.
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Kind of this entity.
    const KIND: EntityKind;

    /// Owner columns this entity carries.
    const OWNER_FIELDS: &'static [OwnerField];

    /// Owner columns whose combined values identify at most one row, such
    /// as one like per user and post. Empty when rows are not deduplicated.
    const UNIQUE_OWNERS: &'static [OwnerField] = &[];

    /// Store-assigned identifier; `0` before the first insert.
    fn id(&self) -> i64;

    /// Returns the entity with the given identifier assigned.
    #[must_use]
    fn with_id(self, id: i64) -> Self;

    /// Value of an owner column, if this entity carries it and it is set.
    fn owner_id(&self, field: OwnerField) -> Option<i64>;

    /// Partition key for events about this entity: the owning entity id.
    fn partition_key(&self) -> i64;
}
