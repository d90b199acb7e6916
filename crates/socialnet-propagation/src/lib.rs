//! SocialNet Propagation — how changes travel between services.
//!
//! Write paths validate cross-service references with the
//! [`CrossServiceValidator`] and emit events through the [`Publisher`].
//! Dependent services consume deletion events with [`CascadeHandler`]s run
//! by a [`WorkerPool`], every invocation wrapped by the [`Recoverer`]'s
//! bounded retry and dead-letter policy. The optional [`OrphanSweep`]
//! repairs rows whose deletion event was lost.

pub mod cascade;
pub mod consumer;
pub mod publisher;
pub mod reconcile;
pub mod recoverer;
pub mod remote;
pub mod validator;

pub use cascade::{CascadeHandler, RowCleanup};
pub use consumer::{HandlerBinding, WorkerPool};
pub use publisher::Publisher;
pub use reconcile::{OrphanSweep, SweepReport, SweepTarget};
pub use recoverer::{
    Backoff, DeadLetterError, DeadLetterRecord, Disposition, MessageState, Recoverer, RetryPolicy,
};
pub use remote::HttpExistenceChecker;
pub use validator::{CrossServiceValidator, Reference, StoreExistenceChecker};
