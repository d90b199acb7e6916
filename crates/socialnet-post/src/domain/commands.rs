//! Commands for the Post service.

use uuid::Uuid;

/// Command to publish a post.
#[derive(Debug, Clone)]
pub struct CreatePost {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Author.
    pub user_id: i64,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
}

/// Command to delete a post.
#[derive(Debug, Clone)]
pub struct DeletePost {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The post identifier.
    pub post_id: i64,
}
