//! Shared application state.

use std::sync::Arc;

use socialnet_comment::domain::entities::Comment;
use socialnet_core::clock::Clock;
use socialnet_core::entity::{Entity, EntityKind};
use socialnet_core::existence::ExistenceChecker;
use socialnet_core::store::{EntityStore, ObjectStorage};
use socialnet_like::domain::entities::{CommentLike, PostLike};
use socialnet_media::domain::entities::Media;
use socialnet_notification::domain::entities::Notification;
use socialnet_post::domain::entities::Post;
use socialnet_propagation::{
    CrossServiceValidator, HttpExistenceChecker, Publisher, StoreExistenceChecker,
};
use socialnet_store::{InMemoryEntityStore, PgEntityStore};
use socialnet_subscription::domain::entities::Subscription;
use socialnet_user::domain::entities::User;
use sqlx::PgPool;

use crate::config::AppConfig;

/// One store per service-owned table.
#[derive(Clone)]
pub struct Stores {
    /// User service.
    pub users: Arc<dyn EntityStore<User>>,
    /// Post service.
    pub posts: Arc<dyn EntityStore<Post>>,
    /// Comment service.
    pub comments: Arc<dyn EntityStore<Comment>>,
    /// Like service, post likes.
    pub post_likes: Arc<dyn EntityStore<PostLike>>,
    /// Like service, comment likes.
    pub comment_likes: Arc<dyn EntityStore<CommentLike>>,
    /// Media service.
    pub media: Arc<dyn EntityStore<Media>>,
    /// Notification service.
    pub notifications: Arc<dyn EntityStore<Notification>>,
    /// Subscription service.
    pub subscriptions: Arc<dyn EntityStore<Subscription>>,
}

impl Stores {
    /// Process-local stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryEntityStore::new()),
            posts: Arc::new(InMemoryEntityStore::new()),
            comments: Arc::new(InMemoryEntityStore::new()),
            post_likes: Arc::new(InMemoryEntityStore::new()),
            comment_likes: Arc::new(InMemoryEntityStore::new()),
            media: Arc::new(InMemoryEntityStore::new()),
            notifications: Arc::new(InMemoryEntityStore::new()),
            subscriptions: Arc::new(InMemoryEntityStore::new()),
        }
    }

    /// PostgreSQL-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgEntityStore::new(pool.clone())),
            posts: Arc::new(PgEntityStore::new(pool.clone())),
            comments: Arc::new(PgEntityStore::new(pool.clone())),
            post_likes: Arc::new(PgEntityStore::new(pool.clone())),
            comment_likes: Arc::new(PgEntityStore::new(pool.clone())),
            media: Arc::new(PgEntityStore::new(pool.clone())),
            notifications: Arc::new(PgEntityStore::new(pool.clone())),
            subscriptions: Arc::new(PgEntityStore::new(pool.clone())),
        }
    }
}

fn checker<E: Entity>(
    remote: Option<&str>,
    local: &Arc<dyn EntityStore<E>>,
) -> Arc<dyn ExistenceChecker> {
    match remote {
        Some(url) => Arc::new(HttpExistenceChecker::new(url)),
        None => Arc::new(StoreExistenceChecker::new(Arc::clone(local))),
    }
}

/// Existence checks for users, posts and comments: over HTTP where a
/// remote service URL is configured, against the local store otherwise.
#[must_use]
pub fn build_validator(config: &AppConfig, stores: &Stores) -> CrossServiceValidator {
    let validator = CrossServiceValidator::new()
        .with_checker(
            EntityKind::User,
            checker(config.user_service_url.as_deref(), &stores.users),
        )
        .with_checker(
            EntityKind::Post,
            checker(config.post_service_url.as_deref(), &stores.posts),
        )
        .with_checker(
            EntityKind::Comment,
            checker(config.comment_service_url.as_deref(), &stores.comments),
        );
    match config.validator_timeout {
        Some(timeout) => validator.with_timeout(timeout),
        None => validator,
    }
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for timestamps.
    pub clock: Arc<dyn Clock>,
    /// Service stores.
    pub stores: Stores,
    /// Object storage behind the media service.
    pub storage: Arc<dyn ObjectStorage>,
    /// Publisher onto the shared event channel.
    pub publisher: Publisher,
    /// Cross-service reference checks.
    pub validator: Arc<CrossServiceValidator>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        stores: Stores,
        storage: Arc<dyn ObjectStorage>,
        publisher: Publisher,
        validator: CrossServiceValidator,
    ) -> Self {
        Self {
            clock,
            stores,
            storage,
            publisher,
            validator: Arc::new(validator),
        }
    }
}
