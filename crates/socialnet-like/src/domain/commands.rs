//! Commands for the Like service.

use uuid::Uuid;

/// Command to like a post.
#[derive(Debug, Clone)]
pub struct LikePost {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The liked post.
    pub post_id: i64,
    /// The liking user.
    pub user_id: i64,
}

/// Command to remove a post like.
#[derive(Debug, Clone)]
pub struct UnlikePost {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The like identifier.
    pub like_id: i64,
}

/// Command to like a comment.
#[derive(Debug, Clone)]
pub struct LikeComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The liked comment.
    pub comment_id: i64,
    /// The liking user.
    pub user_id: i64,
}

/// Command to remove a comment like.
#[derive(Debug, Clone)]
pub struct UnlikeComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The like identifier.
    pub like_id: i64,
}
