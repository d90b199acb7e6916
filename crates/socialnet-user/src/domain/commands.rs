//! Commands for the User service.

use uuid::Uuid;

/// Command to register a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display handle.
    pub username: String,
    /// Contact address.
    pub email: String,
}

/// Command to delete a user and, eventually, everything they own.
#[derive(Debug, Clone)]
pub struct DeleteUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user identifier.
    pub user_id: i64,
}
