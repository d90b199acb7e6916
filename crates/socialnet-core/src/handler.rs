//! Message handler abstraction and failure classification.

use async_trait::async_trait;
use thiserror::Error;

use crate::channel::{ChannelError, Message};
use crate::error::DomainError;

/// Failure of a handler invocation, classified for the retry policy.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Transient failure (network, temporary resource exhaustion). Retried.
    #[error("retryable: {0}")]
    Retryable(String),

    /// Permanent failure (malformed payload, logic error). Dead-lettered
    /// without retry.
    #[error("non-retryable: {0}")]
    NonRetryable(String),
}

impl HandlerError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    /// Classification recorded in dead-letter metadata.
    #[must_use]
    pub const fn classification(&self) -> &'static str {
        match self {
            Self::Retryable(_) => "retryable",
            Self::NonRetryable(_) => "non-retryable",
        }
    }

    /// The failure message without the classification prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Retryable(detail) | Self::NonRetryable(detail) => detail,
        }
    }
}

impl From<ChannelError> for HandlerError {
    fn from(err: ChannelError) -> Self {
        Self::Retryable(err.to_string())
    }
}

impl From<DomainError> for HandlerError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Infrastructure(_) | DomainError::ReferenceCheckFailed { .. } => {
                Self::Retryable(err.to_string())
            }
            other => Self::NonRetryable(other.to_string()),
        }
    }
}

/// What a successful invocation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Local rows deleted (or created, for non-cascade handlers).
    pub affected_rows: u64,
    /// Follow-on events published.
    pub follow_on_events: usize,
}

/// Consumes messages from one channel on behalf of one consumer group.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and dead-letter metadata.
    fn name(&self) -> &str;

    /// Processes one message. Must be idempotent: the same message may be
    /// delivered more than once.
    async fn handle(&self, message: &Message) -> Result<HandlerOutcome, HandlerError>;
}
