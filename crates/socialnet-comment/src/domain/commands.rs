//! Commands for the Comment service.

use uuid::Uuid;

/// Command to comment on a post.
#[derive(Debug, Clone)]
pub struct CreateComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The post being commented on.
    pub post_id: i64,
    /// The commenting user.
    pub user_id: i64,
    /// Comment text.
    pub body: String,
}

/// Command to edit a comment's text.
#[derive(Debug, Clone)]
pub struct UpdateComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The comment identifier.
    pub comment_id: i64,
    /// Replacement text.
    pub body: String,
}

/// Command to delete a comment.
#[derive(Debug, Clone)]
pub struct DeleteComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The comment identifier.
    pub comment_id: i64,
}
