//! Test stores: `EntityStore` implementations for error paths and races.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use socialnet_core::entity::{Entity, OwnerField};
use socialnet_core::error::DomainError;
use socialnet_core::store::EntityStore;

fn refused() -> DomainError {
    DomainError::Infrastructure("connection refused".into())
}

/// A store that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingStore<E>(PhantomData<fn() -> E>);

impl<E> Default for FailingStore<E> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<E> FailingStore<E> {
    /// Creates a new failing store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for FailingStore<E> {
    async fn insert(&self, _entity: E) -> Result<E, DomainError> {
        Err(refused())
    }

    async fn update(&self, _entity: E) -> Result<E, DomainError> {
        Err(refused())
    }

    async fn find(&self, _id: i64) -> Result<Option<E>, DomainError> {
        Err(refused())
    }

    async fn exists(&self, _id: i64) -> Result<bool, DomainError> {
        Err(refused())
    }

    async fn delete(&self, _id: i64) -> Result<Option<E>, DomainError> {
        Err(refused())
    }

    async fn delete_many(&self, _ids: &[i64]) -> Result<u64, DomainError> {
        Err(refused())
    }

    async fn find_by_owners(&self, _owners: &[(OwnerField, i64)]) -> Result<Vec<E>, DomainError> {
        Err(refused())
    }

    async fn find_by_owner(
        &self,
        _field: OwnerField,
        _owner_id: i64,
    ) -> Result<Vec<E>, DomainError> {
        Err(refused())
    }

    async fn delete_by_owner(&self, _field: OwnerField, _owner_id: i64) -> Result<u64, DomainError> {
        Err(refused())
    }

    async fn count_by_owner(&self, _field: OwnerField, _owner_id: i64) -> Result<u64, DomainError> {
        Err(refused())
    }

    async fn distinct_owners(&self, _field: OwnerField) -> Result<Vec<i64>, DomainError> {
        Err(refused())
    }
}

/// Wraps a store and yields to the scheduler before every call, so
/// concurrent callers interleave between their reads and writes.
pub struct YieldingStore<E> {
    inner: Arc<dyn EntityStore<E>>,
}

impl<E: Entity> YieldingStore<E> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn EntityStore<E>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for YieldingStore<E> {
    async fn insert(&self, entity: E) -> Result<E, DomainError> {
        tokio::task::yield_now().await;
        self.inner.insert(entity).await
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        tokio::task::yield_now().await;
        self.inner.update(entity).await
    }

    async fn find(&self, id: i64) -> Result<Option<E>, DomainError> {
        tokio::task::yield_now().await;
        self.inner.find(id).await
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        tokio::task::yield_now().await;
        self.inner.exists(id).await
    }

    async fn delete(&self, id: i64) -> Result<Option<E>, DomainError> {
        tokio::task::yield_now().await;
        self.inner.delete(id).await
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64, DomainError> {
        tokio::task::yield_now().await;
        self.inner.delete_many(ids).await
    }

    async fn find_by_owners(&self, owners: &[(OwnerField, i64)]) -> Result<Vec<E>, DomainError> {
        tokio::task::yield_now().await;
        self.inner.find_by_owners(owners).await
    }

    async fn find_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<Vec<E>, DomainError> {
        tokio::task::yield_now().await;
        self.inner.find_by_owner(field, owner_id).await
    }

    async fn delete_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError> {
        tokio::task::yield_now().await;
        self.inner.delete_by_owner(field, owner_id).await
    }

    async fn count_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError> {
        tokio::task::yield_now().await;
        self.inner.count_by_owner(field, owner_id).await
    }

    async fn distinct_owners(&self, field: OwnerField) -> Result<Vec<i64>, DomainError> {
        tokio::task::yield_now().await;
        self.inner.distinct_owners(field).await
    }
}

/// Wraps a store and commits `late` to it right after the first
/// `find_by_owner` has read its rows, as a concurrent writer would.
pub struct LateInsertStore<E> {
    inner: Arc<dyn EntityStore<E>>,
    late: Mutex<Option<E>>,
}

impl<E: Entity> LateInsertStore<E> {
    /// Wraps `inner`; `late` is inserted once.
    #[must_use]
    pub fn new(inner: Arc<dyn EntityStore<E>>, late: E) -> Self {
        Self {
            inner,
            late: Mutex::new(Some(late)),
        }
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for LateInsertStore<E> {
    async fn insert(&self, entity: E) -> Result<E, DomainError> {
        self.inner.insert(entity).await
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        self.inner.update(entity).await
    }

    async fn find(&self, id: i64) -> Result<Option<E>, DomainError> {
        self.inner.find(id).await
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        self.inner.exists(id).await
    }

    async fn delete(&self, id: i64) -> Result<Option<E>, DomainError> {
        self.inner.delete(id).await
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64, DomainError> {
        self.inner.delete_many(ids).await
    }

    async fn find_by_owners(&self, owners: &[(OwnerField, i64)]) -> Result<Vec<E>, DomainError> {
        self.inner.find_by_owners(owners).await
    }

    async fn find_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<Vec<E>, DomainError> {
        let rows = self.inner.find_by_owner(field, owner_id).await?;
        let late = self.late.lock().unwrap().take();
        if let Some(late) = late {
            self.inner.insert(late).await?;
        }
        Ok(rows)
    }

    async fn delete_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError> {
        self.inner.delete_by_owner(field, owner_id).await
    }

    async fn count_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError> {
        self.inner.count_by_owner(field, owner_id).await
    }

    async fn distinct_owners(&self, field: OwnerField) -> Result<Vec<i64>, DomainError> {
        self.inner.distinct_owners(field).await
    }
}
