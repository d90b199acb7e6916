//! Existence checks against entities owned by other services.

use async_trait::async_trait;
use thiserror::Error;

/// Why an existence check produced no answer.
#[derive(Debug, Error)]
pub enum ExistenceCheckError {
    /// The owning service did not answer in time.
    #[error("timed out after {after_ms} ms")]
    Timeout {
        /// Elapsed budget in milliseconds.
        after_ms: u64,
    },

    /// The request could not be delivered or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The owning service answered with something other than a boolean.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Answers whether an entity exists in the service that owns it.
///
/// Implementations may add caching, timeouts or circuit breaking without
/// changing call sites.
#[async_trait]
pub trait ExistenceChecker: Send + Sync {
    /// Whether the entity with `id` exists.
    async fn exists(&self, id: i64) -> Result<bool, ExistenceCheckError>;
}
