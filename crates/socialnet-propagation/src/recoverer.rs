//! Retry and dead-letter recovery around handler invocations.
//!
//! Every message moves through
//! `received → processing → {committed | retry-scheduled | dead-lettered}`.
//! Retryable failures are retried up to `RetryPolicy::max_attempts` with the
//! policy's delay between attempts; non-retryable failures go straight to
//! the dead-letter channel. A dead-lettered message counts as handled and
//! its offset is committed by the worker.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use socialnet_core::channel::{ChannelError, Message, dead_letter_channel};
use socialnet_core::event::EventEnvelope;
use socialnet_core::handler::{EventHandler, HandlerError, HandlerOutcome};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::publisher::Publisher;

/// Header names carrying dead-letter metadata.
pub mod headers {
    /// Channel the message was originally published on.
    pub const ORIGINAL_CHANNEL: &str = "dlt-original-channel";
    /// Partition the message was read from.
    pub const ORIGINAL_PARTITION: &str = "dlt-original-partition";
    /// Offset of the message in its partition.
    pub const ORIGINAL_OFFSET: &str = "dlt-original-offset";
    /// Event id of the original envelope.
    pub const ORIGINAL_EVENT_ID: &str = "dlt-original-event-id";
    /// `retryable` or `non-retryable`.
    pub const EXCEPTION_CLASS: &str = "dlt-exception-class";
    /// Failure message of the last attempt.
    pub const EXCEPTION_MESSAGE: &str = "dlt-exception-message";
    /// Number of attempts made.
    pub const ATTEMPTS: &str = "dlt-attempts";
    /// Name of the handler that failed.
    pub const HANDLER: &str = "dlt-handler";
    /// RFC 3339 time of dead-lettering.
    pub const FAILED_AT: &str = "dlt-failed-at";
}

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed,
    /// `delay * multiplier^(attempt - 1)`, capped at `max_delay`.
    Exponential {
        /// Growth factor per attempt.
        multiplier: f64,
        /// Upper bound on a single delay.
        max_delay: Duration,
    },
}

/// Bounded retry policy applied to every handler invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub delay: Duration,
    /// Delay growth.
    pub backoff: Backoff,
    /// Random spread (0.0 - 1.0) added on top of each delay.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    /// Three attempts, three seconds apart.
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(3))
    }
}

impl RetryPolicy {
    /// Fixed policy with no jitter.
    #[must_use]
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: Backoff::Fixed,
            jitter: 0.0,
        }
    }

    /// Switches to exponential backoff.
    #[must_use]
    pub const fn with_exponential_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.backoff = Backoff::Exponential {
            multiplier,
            max_delay,
        };
        self
    }

    /// Adds up to `jitter * delay` of random spread to each delay.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Attempts allowed; never less than one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential {
                multiplier,
                max_delay,
            } => {
                let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let secs = self.delay.as_secs_f64() * multiplier.powi(exponent);
                Duration::try_from_secs_f64(secs).map_or(max_delay, |d| d.min(max_delay))
            }
        };
        if self.jitter > 0.0 {
            base.mul_f64(1.0 + rand::random::<f64>() * self.jitter)
        } else {
            base
        }
    }
}

/// Where a message is in its processing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Read from the channel.
    Received,
    /// Handler invocation in progress.
    Processing {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// Failed retryably; another attempt is due after the delay.
    RetryScheduled {
        /// The attempt that failed.
        attempt: u32,
        /// Wait before the next attempt.
        delay: Duration,
    },
    /// Handled; the offset may be committed.
    Committed,
    /// Published to the dead-letter channel; the offset may be committed.
    DeadLettered,
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Received => "received",
            Self::Processing { .. } => "processing",
            Self::RetryScheduled { .. } => "retry-scheduled",
            Self::Committed => "committed",
            Self::DeadLettered => "dead-lettered",
        })
    }
}

/// A dead-lettered message and why it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetterRecord {
    /// Channel the message was originally published on.
    pub original_channel: String,
    /// Partition it was read from.
    pub original_partition: u32,
    /// Offset in that partition.
    pub original_offset: u64,
    /// Event id of the original envelope.
    pub original_event_id: Uuid,
    /// `retryable` or `non-retryable`.
    pub exception_class: String,
    /// Failure message of the last attempt.
    pub exception_message: String,
    /// Attempts made before giving up.
    pub attempts: u32,
    /// Handler that failed.
    pub handler: String,
    /// When the message was dead-lettered.
    pub failed_at: DateTime<Utc>,
    /// The envelope as published on the dead-letter channel.
    pub envelope: EventEnvelope,
}

/// A dead-letter envelope that lacks valid metadata.
#[derive(Debug, Error)]
pub enum DeadLetterError {
    /// A metadata header is absent.
    #[error("missing dead-letter header {0}")]
    MissingHeader(&'static str),

    /// A metadata header could not be parsed.
    #[error("invalid dead-letter header {header}: {value}")]
    InvalidHeader {
        /// Header name.
        header: &'static str,
        /// Raw value.
        value: String,
    },
}

fn header<'a>(envelope: &'a EventEnvelope, name: &'static str) -> Result<&'a str, DeadLetterError> {
    envelope
        .headers
        .get(name)
        .map(String::as_str)
        .ok_or(DeadLetterError::MissingHeader(name))
}

fn parsed<T: std::str::FromStr>(envelope: &EventEnvelope, name: &'static str) -> Result<T, DeadLetterError> {
    let raw = header(envelope, name)?;
    raw.parse().map_err(|_| DeadLetterError::InvalidHeader {
        header: name,
        value: raw.to_owned(),
    })
}

impl DeadLetterRecord {
    fn new(
        message: &Message,
        handler: &str,
        err: &HandlerError,
        attempts: u32,
        failed_at: DateTime<Utc>,
    ) -> Self {
        let original = &message.envelope;
        let mut envelope = original.clone();
        envelope.channel = dead_letter_channel(&original.channel);

        for (name, value) in [
            (headers::ORIGINAL_CHANNEL, original.channel.clone()),
            (headers::ORIGINAL_PARTITION, message.partition.to_string()),
            (headers::ORIGINAL_OFFSET, message.offset.to_string()),
            (headers::ORIGINAL_EVENT_ID, original.event_id.to_string()),
            (headers::EXCEPTION_CLASS, err.classification().to_owned()),
            (headers::EXCEPTION_MESSAGE, err.detail().to_owned()),
            (headers::ATTEMPTS, attempts.to_string()),
            (headers::HANDLER, handler.to_owned()),
            (headers::FAILED_AT, failed_at.to_rfc3339()),
        ] {
            envelope.headers.insert(name.to_owned(), value);
        }

        Self {
            original_channel: original.channel.clone(),
            original_partition: message.partition,
            original_offset: message.offset,
            original_event_id: original.event_id,
            exception_class: err.classification().to_owned(),
            exception_message: err.detail().to_owned(),
            attempts,
            handler: handler.to_owned(),
            failed_at,
            envelope,
        }
    }

    /// Reads the record back from an envelope found on a dead-letter channel.
    ///
    /// # Errors
    ///
    /// Returns `DeadLetterError` if a metadata header is missing or invalid.
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Self, DeadLetterError> {
        let failed_at_raw = header(envelope, headers::FAILED_AT)?;
        let failed_at = DateTime::parse_from_rfc3339(failed_at_raw)
            .map_err(|_| DeadLetterError::InvalidHeader {
                header: headers::FAILED_AT,
                value: failed_at_raw.to_owned(),
            })?
            .with_timezone(&Utc);
        Ok(Self {
            original_channel: header(envelope, headers::ORIGINAL_CHANNEL)?.to_owned(),
            original_partition: parsed(envelope, headers::ORIGINAL_PARTITION)?,
            original_offset: parsed(envelope, headers::ORIGINAL_OFFSET)?,
            original_event_id: parsed(envelope, headers::ORIGINAL_EVENT_ID)?,
            exception_class: header(envelope, headers::EXCEPTION_CLASS)?.to_owned(),
            exception_message: header(envelope, headers::EXCEPTION_MESSAGE)?.to_owned(),
            attempts: parsed(envelope, headers::ATTEMPTS)?,
            handler: header(envelope, headers::HANDLER)?.to_owned(),
            failed_at,
            envelope: envelope.clone(),
        })
    }
}

/// How a message left the recoverer.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// The handler succeeded on attempt `attempts`.
    Committed {
        /// Attempts used.
        attempts: u32,
        /// What the handler did.
        outcome: HandlerOutcome,
    },
    /// Retries were exhausted or skipped; the message is on the DLT.
    DeadLettered(DeadLetterRecord),
}

/// Runs handlers under the retry policy and dead-letters what still fails.
#[derive(Debug, Clone)]
pub struct Recoverer {
    publisher: Publisher,
    policy: RetryPolicy,
}

impl Recoverer {
    /// Creates a new `Recoverer`.
    #[must_use]
    pub fn new(publisher: Publisher, policy: RetryPolicy) -> Self {
        Self { publisher, policy }
    }

    /// The retry policy in force.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Processes `message` with `handler` until it is handled or
    /// dead-lettered.
    ///
    /// # Errors
    ///
    /// Returns the channel error if publishing to the dead-letter channel
    /// failed. The message must then stay uncommitted.
    pub async fn process(
        &self,
        handler: &dyn EventHandler,
        message: &Message,
    ) -> Result<Disposition, ChannelError> {
        let max_attempts = self.policy.attempts();
        self.trace(handler, message, MessageState::Received);

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.trace(handler, message, MessageState::Processing { attempt });

            let err = match handler.handle(message).await {
                Ok(outcome) => {
                    info!(
                        handler = handler.name(),
                        channel = message.channel(),
                        partition = message.partition,
                        offset = message.offset,
                        attempt,
                        affected_rows = outcome.affected_rows,
                        follow_on_events = outcome.follow_on_events,
                        correlation_id = %message.envelope.correlation_id,
                        state = %MessageState::Committed,
                        "message handled"
                    );
                    return Ok(Disposition::Committed {
                        attempts: attempt,
                        outcome,
                    });
                }
                Err(err) => err,
            };

            if err.is_retryable() && attempt < max_attempts {
                let delay = self.policy.delay_for(attempt);
                warn!(
                    handler = handler.name(),
                    channel = message.channel(),
                    partition = message.partition,
                    offset = message.offset,
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    state = %MessageState::RetryScheduled { attempt, delay },
                    "handler failed; retry scheduled"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return self
                .dead_letter(handler, message, &err, attempt)
                .await
                .map(Disposition::DeadLettered);
        }
    }

    async fn dead_letter(
        &self,
        handler: &dyn EventHandler,
        message: &Message,
        err: &HandlerError,
        attempts: u32,
    ) -> Result<DeadLetterRecord, ChannelError> {
        let record = DeadLetterRecord::new(
            message,
            handler.name(),
            err,
            attempts,
            self.publisher.clock().now(),
        );
        self.publisher.publish_envelope(&record.envelope).await?;
        error!(
            handler = handler.name(),
            channel = message.channel(),
            partition = message.partition,
            offset = message.offset,
            attempts,
            exception_class = err.classification(),
            error = %err,
            dead_letter_channel = %record.envelope.channel,
            correlation_id = %message.envelope.correlation_id,
            state = %MessageState::DeadLettered,
            "message dead-lettered"
        );
        Ok(record)
    }

    fn trace(&self, handler: &dyn EventHandler, message: &Message, state: MessageState) {
        let attempt = match state {
            MessageState::Processing { attempt } => attempt,
            _ => 0,
        };
        debug!(
            handler = handler.name(),
            channel = message.channel(),
            partition = message.partition,
            offset = message.offset,
            attempt,
            state = %state,
            "message state"
        );
    }
}
