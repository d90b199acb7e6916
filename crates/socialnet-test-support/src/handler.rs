//! Scripted `EventHandler` for recoverer and worker tests.

use std::sync::Mutex;

use async_trait::async_trait;
use socialnet_core::channel::Message;
use socialnet_core::handler::{EventHandler, HandlerError, HandlerOutcome};
use tokio::time::Instant;

/// How a scripted handler fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Retryable,
    NonRetryable,
}

/// A handler that fails its first `failures` invocations (or every one) and
/// records when each invocation happened.
#[derive(Debug)]
pub struct ScriptedHandler {
    name: String,
    failure: Failure,
    failures: Option<usize>,
    invocations: Mutex<Vec<(u64, Instant)>>,
}

impl ScriptedHandler {
    /// Always succeeds.
    #[must_use]
    pub fn succeeding(name: &str) -> Self {
        Self::build(name, Failure::Retryable, Some(0))
    }

    /// Fails with a retryable error on every invocation.
    #[must_use]
    pub fn always_retryable(name: &str) -> Self {
        Self::build(name, Failure::Retryable, None)
    }

    /// Fails with a non-retryable error on every invocation.
    #[must_use]
    pub fn always_non_retryable(name: &str) -> Self {
        Self::build(name, Failure::NonRetryable, None)
    }

    /// Fails with a retryable error `failures` times, then succeeds.
    #[must_use]
    pub fn retryable_times(name: &str, failures: usize) -> Self {
        Self::build(name, Failure::Retryable, Some(failures))
    }

    fn build(name: &str, failure: Failure, failures: Option<usize>) -> Self {
        Self {
            name: name.to_owned(),
            failure,
            failures,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Number of invocations so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    /// `(offset, instant)` of every invocation, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn invocations(&self) -> Vec<(u64, Instant)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for ScriptedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, message: &Message) -> Result<HandlerOutcome, HandlerError> {
        let attempt = {
            let mut invocations = self.invocations.lock().unwrap();
            invocations.push((message.offset, Instant::now()));
            invocations.len()
        };
        let fails = self.failures.is_none_or(|failures| attempt <= failures);
        if !fails {
            return Ok(HandlerOutcome::default());
        }
        Err(match self.failure {
            Failure::Retryable => HandlerError::Retryable(format!("transient failure #{attempt}")),
            Failure::NonRetryable => {
                HandlerError::NonRetryable(format!("malformed payload at offset {}", message.offset))
            }
        })
    }
}
