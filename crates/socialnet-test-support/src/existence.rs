//! Test existence checkers.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use socialnet_core::existence::{ExistenceCheckError, ExistenceChecker};

/// Answers from a fixed set of existing ids and records every lookup.
#[derive(Debug, Default)]
pub struct StaticExistenceChecker {
    existing: HashSet<i64>,
    calls: Mutex<Vec<i64>>,
}

impl StaticExistenceChecker {
    /// A checker for which exactly `existing` exist.
    #[must_use]
    pub fn new(existing: impl IntoIterator<Item = i64>) -> Self {
        Self {
            existing: existing.into_iter().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Ids looked up so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<i64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExistenceChecker for StaticExistenceChecker {
    async fn exists(&self, id: i64) -> Result<bool, ExistenceCheckError> {
        self.calls.lock().unwrap().push(id);
        Ok(self.existing.contains(&id))
    }
}

/// A checker whose remote service cannot be reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingExistenceChecker;

#[async_trait]
impl ExistenceChecker for FailingExistenceChecker {
    async fn exists(&self, _id: i64) -> Result<bool, ExistenceCheckError> {
        Err(ExistenceCheckError::Transport("connection refused".into()))
    }
}

/// A checker that answers `true` only after `delay`.
#[derive(Debug, Clone, Copy)]
pub struct SlowExistenceChecker(pub Duration);

#[async_trait]
impl ExistenceChecker for SlowExistenceChecker {
    async fn exists(&self, _id: i64) -> Result<bool, ExistenceCheckError> {
        tokio::time::sleep(self.0).await;
        Ok(true)
    }
}
