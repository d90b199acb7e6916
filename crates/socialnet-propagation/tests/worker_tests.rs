//! Worker pool and recoverer behavior over the in-memory channel.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Comment, CommentLike, Post, envelope, publisher, system_channel};
use serde_json::json;
use socialnet_channel::InMemoryChannel;
use socialnet_core::channel::{EventChannel, dead_letter_channel, names};
use socialnet_core::entity::{EntityKind, OwnerField};
use socialnet_core::graph::edges_into;
use socialnet_core::store::EntityStore;
use socialnet_propagation::recoverer::headers;
use socialnet_propagation::{
    CascadeHandler, DeadLetterRecord, HandlerBinding, Recoverer, RetryPolicy, WorkerPool,
};
use socialnet_store::InMemoryEntityStore;
use socialnet_test_support::{FlakyChannel, ScriptedHandler};

async fn wait_until(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(60), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

fn pool(channel: Arc<dyn EventChannel>, policy: RetryPolicy) -> WorkerPool {
    let recoverer = Recoverer::new(publisher(Arc::clone(&channel)), policy);
    WorkerPool::new(channel, Arc::new(recoverer))
}

#[tokio::test(start_paused = true)]
async fn test_always_retryable_handler_is_dead_lettered_after_three_spaced_attempts() {
    // Arrange
    let channel = system_channel();
    let handler = Arc::new(ScriptedHandler::always_retryable("like-service.test"));
    let mut workers = pool(Arc::new(channel.clone()), RetryPolicy::default());
    workers
        .start(HandlerBinding::new(names::COMMENT_DELETED, "like-service.test", handler.clone()))
        .await
        .unwrap();
    let original = envelope(names::COMMENT_DELETED, 3, json!({ "comment_id": 5, "post_id": 3 }));

    // Act
    channel.publish(&original).await.unwrap();
    let dlt = dead_letter_channel(names::COMMENT_DELETED);
    wait_until(|| !channel.records(&dlt).is_empty()).await;
    wait_until(|| channel.lag(names::COMMENT_DELETED, "like-service.test") == 0).await;

    // Assert
    let invocations = handler.invocations();
    assert_eq!(invocations.len(), 3);
    for pair in invocations.windows(2) {
        assert!(pair[1].1 - pair[0].1 >= Duration::from_secs(3));
    }

    let dead = channel.records(&dlt);
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].payload, original.payload);
    assert_eq!(dead[0].partition_key, original.partition_key);
    assert_eq!(dead[0].event_id, original.event_id);
    assert_eq!(dead[0].headers[headers::ATTEMPTS], "3");
    assert_eq!(dead[0].headers[headers::EXCEPTION_CLASS], "retryable");

    let record = DeadLetterRecord::from_envelope(&dead[0]).unwrap();
    assert_eq!(record.original_channel, names::COMMENT_DELETED);
    assert_eq!(record.handler, "like-service.test");
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_handler_is_invoked_once() {
    let channel = system_channel();
    let handler = Arc::new(ScriptedHandler::always_non_retryable("post-service.test"));
    let mut workers = pool(Arc::new(channel.clone()), RetryPolicy::default());
    workers
        .start(HandlerBinding::new(names::USER_DELETED, "post-service.test", handler.clone()))
        .await
        .unwrap();

    channel
        .publish(&envelope(names::USER_DELETED, 7, json!({ "user": "malformed" })))
        .await
        .unwrap();
    let dlt = dead_letter_channel(names::USER_DELETED);
    wait_until(|| !channel.records(&dlt).is_empty()).await;

    assert_eq!(handler.calls(), 1);
    assert_eq!(channel.records(&dlt)[0].headers[headers::ATTEMPTS], "1");
}

#[tokio::test(start_paused = true)]
async fn test_failed_dead_letter_publish_keeps_message_uncommitted_until_it_succeeds() {
    // Arrange
    let channel = system_channel();
    let flaky = Arc::new(FlakyChannel::new(Arc::new(channel.clone()), ".DLT", 1));
    let handler = Arc::new(ScriptedHandler::always_non_retryable("media-service.test"));
    let mut workers = pool(flaky.clone(), RetryPolicy::default());
    workers
        .start(HandlerBinding::new(names::POST_DELETED, "media-service.test", handler.clone()))
        .await
        .unwrap();

    // Act
    channel
        .publish(&envelope(names::POST_DELETED, 7, json!({ "post_id": 1 })))
        .await
        .unwrap();
    let dlt = dead_letter_channel(names::POST_DELETED);
    wait_until(|| !channel.records(&dlt).is_empty()).await;
    wait_until(|| channel.lag(names::POST_DELETED, "media-service.test") == 0).await;

    // Assert
    assert_eq!(flaky.rejected(), 1);
    assert_eq!(handler.calls(), 2);
    assert_eq!(channel.records(&dlt).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_handler_recovering_within_budget_is_committed_without_dead_letter() {
    let channel = system_channel();
    let handler = Arc::new(ScriptedHandler::retryable_times("comment-service.test", 1));
    let mut workers = pool(Arc::new(channel.clone()), RetryPolicy::default());
    workers
        .start(HandlerBinding::new(names::POST_DELETED, "comment-service.test", handler.clone()))
        .await
        .unwrap();

    channel
        .publish(&envelope(names::POST_DELETED, 7, json!({ "post_id": 1 })))
        .await
        .unwrap();
    wait_until(|| channel.lag(names::POST_DELETED, "comment-service.test") == 0).await;

    assert_eq!(handler.calls(), 2);
    assert!(channel.records(&dead_letter_channel(names::POST_DELETED)).is_empty());
}

#[tokio::test]
async fn test_user_deletion_reaches_likes_on_comments_under_the_users_posts() {
    // Arrange
    let channel = system_channel();
    let shared: Arc<dyn EventChannel> = Arc::new(channel.clone());
    let posts = Arc::new(InMemoryEntityStore::<Post>::new());
    let comments = Arc::new(InMemoryEntityStore::<Comment>::new());
    let likes = Arc::new(InMemoryEntityStore::<CommentLike>::new());

    let post = posts.insert(Post { post_id: 0, user_id: 7 }).await.unwrap();
    // A comment by someone else on user 7's post, liked by a third user.
    let comment = comments
        .insert(Comment { comment_id: 0, post_id: post.post_id, user_id: 8 })
        .await
        .unwrap();
    likes
        .insert(CommentLike { like_id: 0, comment_id: comment.comment_id, user_id: 9 })
        .await
        .unwrap();
    let unrelated = likes
        .insert(CommentLike { like_id: 0, comment_id: 999, user_id: 9 })
        .await
        .unwrap();

    let mut workers = pool(
        Arc::clone(&shared),
        RetryPolicy::fixed(3, Duration::from_millis(10)),
    );
    for edge in edges_into(EntityKind::Post) {
        let handler = CascadeHandler::new(edge, posts.clone(), publisher(Arc::clone(&shared))).unwrap();
        workers.start(HandlerBinding::cascade(Arc::new(handler))).await.unwrap();
    }
    for edge in edges_into(EntityKind::Comment) {
        let handler =
            CascadeHandler::new(edge, comments.clone(), publisher(Arc::clone(&shared))).unwrap();
        workers.start(HandlerBinding::cascade(Arc::new(handler))).await.unwrap();
    }
    for edge in edges_into(EntityKind::CommentLike) {
        let handler = CascadeHandler::new(edge, likes.clone(), publisher(Arc::clone(&shared))).unwrap();
        workers.start(HandlerBinding::cascade(Arc::new(handler))).await.unwrap();
    }

    // Act
    channel
        .publish(&envelope(names::USER_DELETED, 7, json!({ "user_id": 7 })))
        .await
        .unwrap();
    wait_until(|| channel.is_drained() && likes.len() == 1).await;

    // Assert
    assert!(posts.is_empty());
    assert!(comments.is_empty());
    assert_eq!(likes.all(), vec![unrelated]);
    assert_eq!(
        likes.count_by_owner(OwnerField::CommentId, comment.comment_id).await.unwrap(),
        0
    );

    channel.close();
    workers.join().await;
}

#[tokio::test]
async fn test_closing_the_channel_stops_workers() {
    let channel = InMemoryChannel::with_system_channels();
    let handler = Arc::new(ScriptedHandler::succeeding("user-service.test"));
    let mut workers = pool(Arc::new(channel.clone()), RetryPolicy::default());
    let started = workers
        .start(HandlerBinding::new(names::USER_DELETED, "user-service.test", handler))
        .await
        .unwrap();

    channel.close();

    assert_eq!(started, 3);
    tokio::time::timeout(Duration::from_secs(5), workers.join())
        .await
        .unwrap();
}
