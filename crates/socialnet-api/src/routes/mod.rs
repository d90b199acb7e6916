//! Route modules organized by service.

pub mod comments;
pub mod health;
pub mod likes;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod subscriptions;
pub mod users;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application: every service under `/api/v1`, traced.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/users", users::router())
        .nest("/api/v1/posts", posts::router())
        .nest("/api/v1/comments", comments::router())
        .nest("/api/v1/likes", likes::router())
        .nest("/api/v1/media", media::router())
        .nest("/api/v1/notifications", notifications::router())
        .nest("/api/v1/subscriptions", subscriptions::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
