//! Cascade wiring: notifications go when their recipient or their actor is
//! deleted.

use std::sync::Arc;

use socialnet_core::store::EntityStore;
use socialnet_propagation::{CascadeHandler, Publisher};

use crate::domain::entities::Notification;

/// Cascade handlers for every edge ending at notifications.
#[must_use]
pub fn cascade_handlers(
    store: &Arc<dyn EntityStore<Notification>>,
    publisher: &Publisher,
) -> Vec<Arc<CascadeHandler<Notification>>> {
    CascadeHandler::for_entity(store, publisher)
        .into_iter()
        .map(Arc::new)
        .collect()
}
