//! Cross-service reference validation.
//!
//! Write paths call `CrossServiceValidator::require_all` before touching
//! their store, so a write that references a missing entity, or whose
//! existence check could not complete, leaves no row and publishes nothing.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use socialnet_core::entity::{Entity, EntityKind};
use socialnet_core::error::DomainError;
use socialnet_core::existence::{ExistenceCheckError, ExistenceChecker};
use socialnet_core::store::EntityStore;
use tracing::{debug, warn};

/// An entity a write refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Kind of the referenced entity.
    pub kind: EntityKind,
    /// Its id.
    pub id: i64,
}

impl Reference {
    /// Creates a new `Reference`.
    #[must_use]
    pub const fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

/// Routes existence checks to the service owning each entity kind.
#[derive(Clone, Default)]
pub struct CrossServiceValidator {
    checkers: HashMap<EntityKind, Arc<dyn ExistenceChecker>>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for CrossServiceValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.checkers.keys().collect();
        kinds.sort();
        f.debug_struct("CrossServiceValidator")
            .field("kinds", &kinds)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CrossServiceValidator {
    /// A validator with no checkers registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the checker answering for `kind`.
    #[must_use]
    pub fn with_checker(mut self, kind: EntityKind, checker: Arc<dyn ExistenceChecker>) -> Self {
        self.checkers.insert(kind, checker);
        self
    }

    /// Bounds every existence check by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Verifies that every reference exists, in order, stopping at the
    /// first one that does not.
    ///
    /// # Errors
    ///
    /// `DomainError::ReferenceNotFound` if the owning service says the
    /// entity is absent; `DomainError::ReferenceCheckFailed` if the check
    /// could not be completed or no checker is registered for the kind.
    pub async fn require_all(&self, references: &[Reference]) -> Result<(), DomainError> {
        for reference in references {
            self.require(*reference).await?;
        }
        Ok(())
    }

    /// Verifies that one reference exists.
    ///
    /// # Errors
    ///
    /// See [`CrossServiceValidator::require_all`].
    pub async fn require(&self, reference: Reference) -> Result<(), DomainError> {
        let Reference { kind, id } = reference;
        let checker = self
            .checkers
            .get(&kind)
            .ok_or_else(|| DomainError::ReferenceCheckFailed {
                kind,
                id,
                reason: "no existence checker registered".to_owned(),
            })?;

        let answer = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, checker.exists(id))
                .await
                .unwrap_or(Err(ExistenceCheckError::Timeout {
                    after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })),
            None => checker.exists(id).await,
        };

        match answer {
            Ok(true) => {
                debug!(kind = %kind, id, "reference exists");
                Ok(())
            }
            Ok(false) => Err(DomainError::ReferenceNotFound { kind, id }),
            Err(err) => {
                warn!(kind = %kind, id, error = %err, "existence check failed");
                Err(DomainError::ReferenceCheckFailed {
                    kind,
                    id,
                    reason: err.to_string(),
                })
            }
        }
    }
}

/// Answers existence checks from a service's local store.
pub struct StoreExistenceChecker<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> StoreExistenceChecker<E> {
    /// Creates a new `StoreExistenceChecker`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore<E>>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> ExistenceChecker for StoreExistenceChecker<E> {
    async fn exists(&self, id: i64) -> Result<bool, ExistenceCheckError> {
        self.store
            .exists(id)
            .await
            .map_err(|err| ExistenceCheckError::Transport(err.to_string()))
    }
}
