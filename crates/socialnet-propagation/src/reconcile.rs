//! Orphan reconciliation sweep.
//!
//! Deletion events can be lost between a local commit and its publish. The
//! sweep periodically lists the distinct owner ids each cascade target
//! references, asks the owning service whether each one still exists, and
//! runs the cascade for owners that are gone. Owners whose existence cannot
//! be confirmed either way are left alone until the next run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use socialnet_core::entity::Entity;
use socialnet_core::error::DomainError;
use socialnet_core::event::EventContext;
use socialnet_core::graph::CascadeEdge;
use socialnet_core::handler::HandlerError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cascade::CascadeHandler;
use crate::validator::{CrossServiceValidator, Reference};

/// Totals for one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Owner ids checked.
    pub checked_owners: u64,
    /// Owners found to be deleted.
    pub orphaned_owners: u64,
    /// Rows removed.
    pub deleted_rows: u64,
    /// Owners skipped because the check or the cascade failed.
    pub skipped_owners: u64,
}

impl SweepReport {
    fn absorb(&mut self, other: Self) {
        self.checked_owners += other.checked_owners;
        self.orphaned_owners += other.orphaned_owners;
        self.deleted_rows += other.deleted_rows;
        self.skipped_owners += other.skipped_owners;
    }
}

/// A cascade target the sweep can scan.
#[async_trait]
pub trait SweepTarget: Send + Sync {
    /// The graph edge being reconciled.
    fn edge(&self) -> &'static CascadeEdge;

    /// Distinct owner ids referenced by the target's rows.
    async fn owners(&self) -> Result<Vec<i64>, DomainError>;

    /// Deletes the rows of a vanished owner.
    async fn remove_orphans(&self, owner_id: i64, context: EventContext)
    -> Result<u64, HandlerError>;
}

#[async_trait]
impl<E: Entity> SweepTarget for CascadeHandler<E> {
    fn edge(&self) -> &'static CascadeEdge {
        CascadeHandler::edge(self)
    }

    async fn owners(&self) -> Result<Vec<i64>, DomainError> {
        self.store().distinct_owners(self.edge().field).await
    }

    async fn remove_orphans(
        &self,
        owner_id: i64,
        context: EventContext,
    ) -> Result<u64, HandlerError> {
        self.cascade_owner(owner_id, context)
            .await
            .map(|outcome| outcome.affected_rows)
    }
}

/// Periodic scan for rows referencing deleted owners.
pub struct OrphanSweep {
    validator: CrossServiceValidator,
    targets: Vec<Arc<dyn SweepTarget>>,
}

impl std::fmt::Debug for OrphanSweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrphanSweep")
            .field("targets", &self.targets.len())
            .finish_non_exhaustive()
    }
}

impl OrphanSweep {
    /// A sweep that checks owners through `validator`.
    #[must_use]
    pub fn new(validator: CrossServiceValidator) -> Self {
        Self {
            validator,
            targets: Vec::new(),
        }
    }

    /// Adds a target to scan.
    #[must_use]
    pub fn with_target(mut self, target: Arc<dyn SweepTarget>) -> Self {
        self.targets.push(target);
        self
    }

    /// Scans every target once.
    pub async fn run_once(&self) -> SweepReport {
        let context = EventContext::new(Uuid::new_v4());
        let mut report = SweepReport::default();
        for target in &self.targets {
            report.absorb(self.sweep(target.as_ref(), context).await);
        }
        info!(
            correlation_id = %context.correlation_id,
            checked_owners = report.checked_owners,
            orphaned_owners = report.orphaned_owners,
            deleted_rows = report.deleted_rows,
            skipped_owners = report.skipped_owners,
            "orphan sweep finished"
        );
        report
    }

    async fn sweep(&self, target: &dyn SweepTarget, context: EventContext) -> SweepReport {
        let edge = target.edge();
        let mut report = SweepReport::default();
        let owners = match target.owners().await {
            Ok(owners) => owners,
            Err(err) => {
                warn!(group = %edge.group(), error = %err, "could not list owners");
                return report;
            }
        };

        for owner_id in owners {
            report.checked_owners += 1;
            match self.validator.require(Reference::new(edge.owner, owner_id)).await {
                Ok(()) => continue,
                Err(DomainError::ReferenceNotFound { .. }) => {}
                Err(err) => {
                    debug!(group = %edge.group(), owner_id, error = %err, "owner check inconclusive");
                    report.skipped_owners += 1;
                    continue;
                }
            }

            report.orphaned_owners += 1;
            match target.remove_orphans(owner_id, context).await {
                Ok(deleted) => {
                    report.deleted_rows += deleted;
                    info!(group = %edge.group(), owner_id, deleted, "orphaned rows removed");
                }
                Err(err) => {
                    warn!(group = %edge.group(), owner_id, error = %err, "orphan removal failed");
                    report.skipped_owners += 1;
                }
            }
        }
        report
    }

    /// Runs the sweep every `period` until the returned task is aborted.
    #[must_use]
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }
}
