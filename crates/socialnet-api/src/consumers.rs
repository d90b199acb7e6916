//! Wiring of every service's event consumers onto the shared channel.

use std::sync::Arc;
use std::time::Duration;

use socialnet_core::channel::{ChannelError, EventChannel};
use socialnet_core::entity::Entity;
use socialnet_notification::application::event_handlers::FollowNotifier;
use socialnet_propagation::{
    CascadeHandler, HandlerBinding, OrphanSweep, Recoverer, RetryPolicy, SweepTarget, WorkerPool,
};
use tokio::task::JoinHandle;
use tracing::info;

use crate::state::AppState;

/// Every consumer the host runs, plus the cascades as sweep targets.
pub struct Consumers {
    bindings: Vec<HandlerBinding>,
    targets: Vec<Arc<dyn SweepTarget>>,
}

impl Consumers {
    /// Builds the cascade handlers of all services and the follow notifier.
    #[must_use]
    pub fn new(state: &AppState) -> Self {
        let stores = &state.stores;
        let publisher = &state.publisher;
        let mut consumers = Self {
            bindings: Vec::new(),
            targets: Vec::new(),
        };

        consumers.add_cascades(socialnet_post::application::cascades::cascade_handlers(
            &stores.posts,
            publisher,
        ));
        consumers.add_cascades(socialnet_comment::application::cascades::cascade_handlers(
            &stores.comments,
            publisher,
        ));
        consumers.add_cascades(socialnet_like::application::cascades::post_like_cascades(
            &stores.post_likes,
            publisher,
        ));
        consumers.add_cascades(socialnet_like::application::cascades::comment_like_cascades(
            &stores.comment_likes,
            publisher,
        ));
        consumers.add_cascades(socialnet_media::application::cascades::cascade_handlers(
            &stores.media,
            &state.storage,
            publisher,
        ));
        consumers.add_cascades(
            socialnet_notification::application::cascades::cascade_handlers(
                &stores.notifications,
                publisher,
            ),
        );
        consumers.add_cascades(
            socialnet_subscription::application::cascades::cascade_handlers(
                &stores.subscriptions,
                publisher,
            ),
        );

        let notifier = Arc::new(FollowNotifier::new(
            Arc::clone(&stores.notifications),
            Arc::clone(&state.clock),
        ));
        consumers.bindings.push(notifier.binding());
        consumers
    }

    fn add_cascades<E: Entity>(&mut self, handlers: Vec<Arc<CascadeHandler<E>>>) {
        for handler in handlers {
            self.targets.push(handler.clone());
            self.bindings.push(HandlerBinding::cascade(handler));
        }
    }

    /// The bindings, one per consumer group.
    #[must_use]
    pub fn bindings(&self) -> &[HandlerBinding] {
        &self.bindings
    }

    /// Starts a worker per partition for every binding.
    ///
    /// # Errors
    ///
    /// Returns the channel error if a subscription fails.
    pub async fn start(
        &self,
        channel: Arc<dyn EventChannel>,
        recoverer: Recoverer,
    ) -> Result<WorkerPool, ChannelError> {
        let mut pool = WorkerPool::new(channel, Arc::new(recoverer));
        for binding in &self.bindings {
            pool.start(binding.clone()).await?;
        }
        info!(consumers = self.bindings.len(), workers = pool.len(), "consumers started");
        Ok(pool)
    }

    /// Starts the periodic orphan sweep over every cascade target.
    #[must_use]
    pub fn spawn_orphan_sweep(&self, state: &AppState, period: Duration) -> JoinHandle<()> {
        let sweep = self.targets.iter().fold(
            OrphanSweep::new(state.validator.as_ref().clone()),
            |sweep, target| sweep.with_target(Arc::clone(target)),
        );
        Arc::new(sweep).spawn(period)
    }
}

/// Recoverer for the configured retry policy, dead-lettering through the
/// state's publisher.
#[must_use]
pub fn recoverer(state: &AppState, policy: RetryPolicy) -> Recoverer {
    Recoverer::new(state.publisher.clone(), policy)
}
