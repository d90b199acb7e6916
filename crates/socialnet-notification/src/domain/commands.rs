//! Commands for the Notification service.

use uuid::Uuid;

/// Command to dismiss a notification.
#[derive(Debug, Clone)]
pub struct DeleteNotification {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The notification identifier.
    pub notification_id: i64,
}
