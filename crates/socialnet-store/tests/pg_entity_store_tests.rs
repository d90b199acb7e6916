//! Integration tests for `PgEntityStore`.
//!
//! Require a PostgreSQL instance reachable through `DATABASE_URL`; run with
//! `cargo test -- --ignored`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;
use socialnet_store::pg_entity_store::PgEntityStore;
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestComment {
    comment_id: i64,
    post_id: i64,
    user_id: i64,
    body: String,
    created_at: DateTime<Utc>,
}

impl Entity for TestComment {
    const KIND: EntityKind = EntityKind::Comment;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::PostId];

    fn id(&self) -> i64 {
        self.comment_id
    }

    fn with_id(self, comment_id: i64) -> Self {
        Self { comment_id, ..self }
    }

    fn owner_id(&self, field: OwnerField) -> Option<i64> {
        match field {
            OwnerField::UserId => Some(self.user_id),
            OwnerField::PostId => Some(self.post_id),
            _ => None,
        }
    }

    fn partition_key(&self) -> i64 {
        self.post_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestPostLike {
    like_id: i64,
    post_id: i64,
    user_id: i64,
}

impl Entity for TestPostLike {
    const KIND: EntityKind = EntityKind::PostLike;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::PostId];
    const UNIQUE_OWNERS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::PostId];

    fn id(&self) -> i64 {
        self.like_id
    }

    fn with_id(self, like_id: i64) -> Self {
        Self { like_id, ..self }
    }

    fn owner_id(&self, field: OwnerField) -> Option<i64> {
        match field {
            OwnerField::UserId => Some(self.user_id),
            OwnerField::PostId => Some(self.post_id),
            _ => None,
        }
    }

    fn partition_key(&self) -> i64 {
        self.post_id
    }
}

/// Helper to build a comment with sensible defaults.
fn make_comment(post_id: i64, user_id: i64) -> TestComment {
    TestComment {
        comment_id: 0,
        post_id,
        user_id,
        body: "hello".to_string(),
        created_at: Utc::now(),
    }
}

// --- insert / find ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_insert_and_find_round_trip(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);

    let inserted = store.insert(make_comment(5, 7)).await.unwrap();
    let loaded = store.find(inserted.comment_id).await.unwrap().unwrap();

    assert!(inserted.comment_id > 0);
    assert_eq!(loaded.comment_id, inserted.comment_id);
    assert_eq!(loaded.post_id, 5);
    assert_eq!(loaded.body, "hello");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_find_returns_none_for_missing_row(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);

    assert!(store.find(999).await.unwrap().is_none());
    assert!(!store.exists(999).await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_insert_stores_assigned_id_in_snapshot(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool.clone());

    let inserted = store.insert(make_comment(5, 7)).await.unwrap();

    let data: serde_json::Value = sqlx::query_scalar("SELECT data FROM comments WHERE id = $1")
        .bind(inserted.comment_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(data["comment_id"], inserted.comment_id);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_unique_owners_is_conflict(pool: PgPool) {
    // Arrange
    let store = PgEntityStore::<TestPostLike>::new(pool);
    let like = TestPostLike { like_id: 0, post_id: 1, user_id: 7 };
    store.insert(like.clone()).await.unwrap();

    // Act
    let (a, b) = tokio::join!(store.insert(like.clone()), store.insert(like.clone()));

    // Assert
    assert!(matches!(a, Err(DomainError::Conflict(_))));
    assert!(matches!(b, Err(DomainError::Conflict(_))));
    assert_eq!(store.count_by_owner(OwnerField::PostId, 1).await.unwrap(), 1);
}

// --- update ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_update_replaces_snapshot(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);
    let inserted = store.insert(make_comment(5, 7)).await.unwrap();

    let mut changed = inserted.clone();
    changed.body = "edited".to_string();
    store.update(changed).await.unwrap();

    let loaded = store.find(inserted.comment_id).await.unwrap().unwrap();
    assert_eq!(loaded.body, "edited");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_update_missing_row_returns_not_found(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);

    let result = store.update(make_comment(5, 7).with_id(4242)).await;

    assert!(matches!(result, Err(DomainError::NotFound { id: 4242, .. })));
}

// --- owner queries ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_delete_by_owner_is_idempotent(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);
    store.insert(make_comment(5, 1)).await.unwrap();
    store.insert(make_comment(5, 2)).await.unwrap();
    store.insert(make_comment(6, 1)).await.unwrap();

    let first = store.delete_by_owner(OwnerField::PostId, 5).await.unwrap();
    let second = store.delete_by_owner(OwnerField::PostId, 5).await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(store.count_by_owner(OwnerField::PostId, 6).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_delete_many_removes_only_listed_ids(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);
    let a = store.insert(make_comment(5, 1)).await.unwrap();
    let b = store.insert(make_comment(5, 2)).await.unwrap();
    store.insert(make_comment(5, 3)).await.unwrap();

    let deleted = store.delete_many(&[a.comment_id, b.comment_id, 9999]).await.unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(store.count_by_owner(OwnerField::PostId, 5).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_owners_matches_all_columns(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);
    store.insert(make_comment(5, 1)).await.unwrap();
    let wanted = store.insert(make_comment(6, 1)).await.unwrap();

    let rows = store
        .find_by_owners(&[(OwnerField::UserId, 1), (OwnerField::PostId, 6)])
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].comment_id, wanted.comment_id);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_owner_orders_by_id(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);
    let a = store.insert(make_comment(1, 9)).await.unwrap();
    store.insert(make_comment(2, 8)).await.unwrap();
    let c = store.insert(make_comment(3, 9)).await.unwrap();

    let rows = store.find_by_owner(OwnerField::UserId, 9).await.unwrap();

    let ids: Vec<i64> = rows.iter().map(|r| r.comment_id).collect();
    assert_eq!(ids, vec![a.comment_id, c.comment_id]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_distinct_owners(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);
    store.insert(make_comment(4, 1)).await.unwrap();
    store.insert(make_comment(2, 1)).await.unwrap();
    store.insert(make_comment(4, 3)).await.unwrap();

    let owners = store.distinct_owners(OwnerField::PostId).await.unwrap();

    assert_eq!(owners, vec![2, 4]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_delete_returns_removed_row(pool: PgPool) {
    let store = PgEntityStore::<TestComment>::new(pool);
    let inserted = store.insert(make_comment(5, 7)).await.unwrap();

    let removed = store.delete(inserted.comment_id).await.unwrap();
    let again = store.delete(inserted.comment_id).await.unwrap();

    assert_eq!(removed.unwrap().comment_id, inserted.comment_id);
    assert!(again.is_none());
}
