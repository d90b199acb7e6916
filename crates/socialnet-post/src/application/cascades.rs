//! Cascade wiring: posts are removed when their author is deleted.

use std::sync::Arc;

use socialnet_core::store::EntityStore;
use socialnet_propagation::{CascadeHandler, Publisher};

use crate::domain::entities::Post;

/// Cascade handlers for every edge ending at posts.
#[must_use]
pub fn cascade_handlers(
    store: &Arc<dyn EntityStore<Post>>,
    publisher: &Publisher,
) -> Vec<Arc<CascadeHandler<Post>>> {
    CascadeHandler::for_entity(store, publisher)
        .into_iter()
        .map(Arc::new)
        .collect()
}
