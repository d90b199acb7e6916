//! Cascade wiring: comments go when their post or their author is deleted.

use std::sync::Arc;

use socialnet_core::store::EntityStore;
use socialnet_propagation::{CascadeHandler, Publisher};

use crate::domain::entities::Comment;

/// Cascade handlers for every edge ending at comments.
#[must_use]
pub fn cascade_handlers(
    store: &Arc<dyn EntityStore<Comment>>,
    publisher: &Publisher,
) -> Vec<Arc<CascadeHandler<Comment>>> {
    CascadeHandler::for_entity(store, publisher)
        .into_iter()
        .map(Arc::new)
        .collect()
}
