//! Consumer worker pool.
//!
//! Each binding subscribes one handler to one channel under one consumer
//! group; every partition the subscription claims gets its own tokio task,
//! so messages with different keys are handled concurrently while messages
//! sharing a key are handled in order.

use std::sync::Arc;

use socialnet_core::channel::{ChannelError, EventChannel, Message, PartitionReader};
use socialnet_core::entity::Entity;
use socialnet_core::handler::EventHandler;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cascade::CascadeHandler;
use crate::recoverer::{Disposition, Recoverer};

/// A handler subscribed to a channel under a consumer group.
#[derive(Clone)]
pub struct HandlerBinding {
    /// Channel to consume.
    pub channel: String,
    /// Consumer group name.
    pub group: String,
    /// Handler invoked per message.
    pub handler: Arc<dyn EventHandler>,
}

impl std::fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("channel", &self.channel)
            .field("group", &self.group)
            .field("handler", &self.handler.name())
            .finish()
    }
}

impl HandlerBinding {
    /// Binds `handler` to `channel` under `group`.
    #[must_use]
    pub fn new(
        channel: impl Into<String>,
        group: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            channel: channel.into(),
            group: group.into(),
            handler,
        }
    }

    /// Binds a cascade handler to its edge's trigger channel and group.
    #[must_use]
    pub fn cascade<E: Entity>(handler: Arc<CascadeHandler<E>>) -> Self {
        let edge = handler.edge();
        Self::new(edge.trigger(), edge.group(), handler)
    }
}

/// Runs bound handlers until the channel closes.
pub struct WorkerPool {
    channel: Arc<dyn EventChannel>,
    recoverer: Arc<Recoverer>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(channel: Arc<dyn EventChannel>, recoverer: Arc<Recoverer>) -> Self {
        Self {
            channel,
            recoverer,
            workers: Vec::new(),
        }
    }

    /// Subscribes `binding` and spawns one worker per claimed partition.
    /// Returns how many workers were started.
    ///
    /// # Errors
    ///
    /// Returns the channel error if the subscription fails.
    pub async fn start(&mut self, binding: HandlerBinding) -> Result<usize, ChannelError> {
        let readers = self
            .channel
            .subscribe(&binding.channel, &binding.group)
            .await?;
        let started = readers.len();
        for reader in readers {
            let worker = Worker {
                reader,
                group: binding.group.clone(),
                handler: Arc::clone(&binding.handler),
                recoverer: Arc::clone(&self.recoverer),
            };
            self.workers.push(tokio::spawn(worker.run()));
        }
        info!(
            channel = %binding.channel,
            group = %binding.group,
            workers = started,
            "consumer started"
        );
        Ok(started)
    }

    /// Number of running or finished workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether no worker was started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Waits for every worker to exit. Workers exit once the channel is
    /// closed.
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(err) = worker.await {
                error!(error = %err, "consumer worker panicked");
            }
        }
    }
}

struct Worker {
    reader: Box<dyn PartitionReader>,
    group: String,
    handler: Arc<dyn EventHandler>,
    recoverer: Arc<Recoverer>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            let message = match self.reader.next_message().await {
                Ok(Some(message)) => message,
                Ok(None) | Err(ChannelError::Closed) => break,
                Err(err) => {
                    warn!(
                        channel = self.reader.channel(),
                        partition = self.reader.partition(),
                        group = %self.group,
                        error = %err,
                        "read failed; retrying"
                    );
                    tokio::time::sleep(self.recoverer.policy().delay).await;
                    continue;
                }
            };
            if !self.deliver(&message).await {
                break;
            }
        }
        debug!(
            channel = self.reader.channel(),
            partition = self.reader.partition(),
            group = %self.group,
            "consumer worker stopped"
        );
    }

    /// Processes `message` until it can be committed. Returns `false` when
    /// the channel closed underneath it.
    async fn deliver(&mut self, message: &Message) -> bool {
        loop {
            match self.recoverer.process(self.handler.as_ref(), message).await {
                Ok(disposition) => {
                    if let Disposition::DeadLettered(record) = &disposition {
                        debug!(
                            dead_letter_channel = %record.envelope.channel,
                            offset = message.offset,
                            "committing dead-lettered message"
                        );
                    }
                    return match self.reader.commit(message).await {
                        Ok(()) => true,
                        Err(ChannelError::Closed) => false,
                        Err(err) => {
                            warn!(
                                channel = message.channel(),
                                partition = message.partition,
                                offset = message.offset,
                                error = %err,
                                "commit failed; message may be redelivered"
                            );
                            true
                        }
                    };
                }
                Err(ChannelError::Closed) => return false,
                Err(err) => {
                    error!(
                        channel = message.channel(),
                        partition = message.partition,
                        offset = message.offset,
                        group = %self.group,
                        error = %err,
                        "dead-letter publish failed; message left uncommitted"
                    );
                    tokio::time::sleep(self.recoverer.policy().delay).await;
                }
            }
        }
    }
}
