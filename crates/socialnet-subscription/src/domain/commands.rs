//! Commands for the Subscription service.

use uuid::Uuid;

/// Command for one user to follow another.
#[derive(Debug, Clone)]
pub struct Follow {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The following user.
    pub follower_id: i64,
    /// The followed user.
    pub followee_id: i64,
}

/// Command to end a subscription.
#[derive(Debug, Clone)]
pub struct Unfollow {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The subscription identifier.
    pub subscription_id: i64,
}
