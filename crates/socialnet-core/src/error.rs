//! Domain error types.

use thiserror::Error;

use crate::entity::EntityKind;

/// Top-level domain error type returned by write paths and stores.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The targeted entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of the missing entity.
        kind: EntityKind,
        /// Identifier that was looked up.
        id: i64,
    },

    /// An entity referenced by a write does not exist in its owning service.
    #[error("referenced {kind} {id} does not exist")]
    ReferenceNotFound {
        /// Kind of the referenced entity.
        kind: EntityKind,
        /// Identifier of the referenced entity.
        id: i64,
    },

    /// The existence check for a referenced entity could not be completed.
    #[error("existence check for {kind} {id} failed: {reason}")]
    ReferenceCheckFailed {
        /// Kind of the referenced entity.
        kind: EntityKind,
        /// Identifier of the referenced entity.
        id: i64,
        /// Why the check failed.
        reason: String,
    },

    /// The write conflicts with existing state (duplicate like, follow, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::ReferenceNotFound { .. } => "referenced_entity_not_found",
            Self::ReferenceCheckFailed { .. } => "reference_check_failed",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation_error",
            Self::Infrastructure(_) => "infrastructure_error",
        }
    }
}
