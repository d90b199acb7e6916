//! Test channels: `EventChannel` implementations that fail on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use socialnet_core::channel::{
    ChannelError, ChannelSpec, EventChannel, PartitionReader, RecordPosition,
};
use socialnet_core::event::EventEnvelope;

/// A channel whose broker is never reachable. Useful for testing
/// publish-after-commit and handler error paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingChannel;

#[async_trait]
impl EventChannel for FailingChannel {
    async fn declare(&self, _spec: &ChannelSpec) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable("broker unreachable".into()))
    }

    async fn publish(&self, _envelope: &EventEnvelope) -> Result<RecordPosition, ChannelError> {
        Err(ChannelError::Unavailable("broker unreachable".into()))
    }

    async fn subscribe(
        &self,
        _channel: &str,
        _group: &str,
    ) -> Result<Vec<Box<dyn PartitionReader>>, ChannelError> {
        Err(ChannelError::Unavailable("broker unreachable".into()))
    }
}

/// Wraps a working channel and fails the next `failures` publishes whose
/// channel name ends with `suffix`. Everything else is delegated.
pub struct FlakyChannel {
    inner: Arc<dyn EventChannel>,
    suffix: String,
    remaining: AtomicUsize,
    rejected: AtomicUsize,
}

impl FlakyChannel {
    /// Fails the next `failures` publishes to channels ending in `suffix`.
    #[must_use]
    pub fn new(inner: Arc<dyn EventChannel>, suffix: impl Into<String>, failures: usize) -> Self {
        Self {
            inner,
            suffix: suffix.into(),
            remaining: AtomicUsize::new(failures),
            rejected: AtomicUsize::new(0),
        }
    }

    /// How many publishes were rejected so far.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventChannel for FlakyChannel {
    async fn declare(&self, spec: &ChannelSpec) -> Result<(), ChannelError> {
        self.inner.declare(spec).await
    }

    async fn publish(&self, envelope: &EventEnvelope) -> Result<RecordPosition, ChannelError> {
        if envelope.channel.ends_with(&self.suffix)
            && self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(ChannelError::Unavailable(format!(
                "injected failure publishing to {}",
                envelope.channel
            )));
        }
        self.inner.publish(envelope).await
    }

    async fn subscribe(
        &self,
        channel: &str,
        group: &str,
    ) -> Result<Vec<Box<dyn PartitionReader>>, ChannelError> {
        self.inner.subscribe(channel, group).await
    }
}
