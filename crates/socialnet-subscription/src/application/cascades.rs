//! Cascade wiring: a deleted user's subscriptions go in both directions.

use std::sync::Arc;

use socialnet_core::store::EntityStore;
use socialnet_propagation::{CascadeHandler, Publisher};

use crate::domain::entities::Subscription;

/// Cascade handlers for every edge ending at subscriptions.
#[must_use]
pub fn cascade_handlers(
    store: &Arc<dyn EntityStore<Subscription>>,
    publisher: &Publisher,
) -> Vec<Arc<CascadeHandler<Subscription>>> {
    CascadeHandler::for_entity(store, publisher)
        .into_iter()
        .map(Arc::new)
        .collect()
}
