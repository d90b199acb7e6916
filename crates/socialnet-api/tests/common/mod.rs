//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use socialnet_api::config::AppConfig;
use socialnet_api::consumers::{self, Consumers};
use socialnet_api::routes;
use socialnet_api::state::{self, AppState, Stores};
use socialnet_channel::InMemoryChannel;
use socialnet_core::clock::Clock;
use socialnet_propagation::{Publisher, RetryPolicy, WorkerPool};
use socialnet_store::InMemoryObjectStorage;
use socialnet_test_support::FixedClock;
use tower::ServiceExt;

/// An in-memory host: stores, channel and state, without consumers.
pub struct TestHost {
    pub state: AppState,
    pub channel: InMemoryChannel,
}

impl TestHost {
    /// In-memory stores, local existence checks and a fixed clock.
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
        let channel = InMemoryChannel::with_system_channels();
        let stores = Stores::in_memory();
        let validator = state::build_validator(&AppConfig::default(), &stores);
        let state = AppState::new(
            Arc::clone(&clock),
            stores,
            Arc::new(InMemoryObjectStorage::new("http://objects.test")),
            Publisher::new(Arc::new(channel.clone()), clock),
            validator,
        );
        Self { state, channel }
    }

    /// The full router, as served by `main.rs`.
    pub fn app(&self) -> Router {
        routes::app(self.state.clone())
    }

    /// Starts every consumer with a fast retry policy.
    pub async fn start_consumers(&self) -> WorkerPool {
        Consumers::new(&self.state)
            .start(
                Arc::new(self.channel.clone()),
                consumers::recoverer(
                    &self.state,
                    RetryPolicy::fixed(3, Duration::from_millis(10)),
                ),
            )
            .await
            .unwrap()
    }

    /// Waits until every published message has been committed by every
    /// consumer group.
    pub async fn drain(&self) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while !self.channel.is_drained() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    pub async fn post_json(&self, uri: &str, body: &serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        send(self.app(), request).await
    }

    pub async fn put_json(&self, uri: &str, body: &serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        send(self.app(), request).await
    }

    pub async fn post_bytes(&self, uri: &str, bytes: &'static [u8]) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/octet-stream")
            .body(Body::from(bytes))
            .unwrap();
        send(self.app(), request).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(self.app(), request).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(self.app(), request).await
    }

    /// Creates a user and returns its id.
    pub async fn create_user(&self, username: &str) -> i64 {
        let (status, json) = self
            .post_json(
                "/api/v1/users",
                &serde_json::json!({ "username": username, "email": format!("{username}@example.com") }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["user_id"].as_i64().unwrap()
    }

    /// Creates a post by `user_id` and returns its id.
    pub async fn create_post(&self, user_id: i64) -> i64 {
        let (status, json) = self
            .post_json(
                "/api/v1/posts",
                &serde_json::json!({ "user_id": user_id, "title": "Hello", "body": "world" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["post_id"].as_i64().unwrap()
    }

    /// Comments on `post_id` as `user_id` and returns the comment id.
    pub async fn create_comment(&self, post_id: i64, user_id: i64) -> i64 {
        let (status, json) = self
            .post_json(
                "/api/v1/comments",
                &serde_json::json!({ "post_id": post_id, "user_id": user_id, "body": "nice" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["comment_id"].as_i64().unwrap()
    }
}

/// Sends `request` and returns the status with the JSON body (`Null` when
/// the body is empty).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, json)
}
