//! In-memory implementation of the `EntityStore` trait.
//!
//! Used by the host when no database is configured and by tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use socialnet_core::entity::{Entity, OwnerField};
use socialnet_core::error::DomainError;
use socialnet_core::store::{EntityStore, check_owner_field, duplicate_owners, unique_owner_key};

/// Rows of one entity type, keyed by id.
#[derive(Debug)]
pub struct InMemoryEntityStore<E> {
    rows: RwLock<BTreeMap<i64, E>>,
    next_id: AtomicI64,
}

impl<E> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl<E: Entity> InMemoryEntityStore<E> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of every row, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<E> {
        self.read().values().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<i64, E>> {
        self.rows.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<i64, E>> {
        self.rows.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for InMemoryEntityStore<E> {
    async fn insert(&self, entity: E) -> Result<E, DomainError> {
        let mut rows = self.write();
        if let Some(key) = unique_owner_key(&entity) {
            if rows.values().any(|row| unique_owner_key(row).as_ref() == Some(&key)) {
                return Err(duplicate_owners(&entity));
            }
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entity = entity.with_id(id);
        rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let mut rows = self.write();
        match rows.get_mut(&entity.id()) {
            Some(row) => {
                *row = entity.clone();
                Ok(entity)
            }
            None => Err(DomainError::NotFound {
                kind: E::KIND,
                id: entity.id(),
            }),
        }
    }

    async fn find(&self, id: i64) -> Result<Option<E>, DomainError> {
        Ok(self.read().get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.read().contains_key(&id))
    }

    async fn delete(&self, id: i64) -> Result<Option<E>, DomainError> {
        Ok(self.write().remove(&id))
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64, DomainError> {
        let mut rows = self.write();
        Ok(ids.iter().filter(|id| rows.remove(id).is_some()).count() as u64)
    }

    async fn find_by_owners(&self, owners: &[(OwnerField, i64)]) -> Result<Vec<E>, DomainError> {
        for (field, _) in owners {
            check_owner_field::<E>(*field)?;
        }
        Ok(self
            .read()
            .values()
            .filter(|row| {
                owners
                    .iter()
                    .all(|(field, owner_id)| row.owner_id(*field) == Some(*owner_id))
            })
            .cloned()
            .collect())
    }

    async fn find_by_owner(
        &self,
        field: OwnerField,
        owner_id: i64,
    ) -> Result<Vec<E>, DomainError> {
        check_owner_field::<E>(field)?;
        Ok(self
            .read()
            .values()
            .filter(|row| row.owner_id(field) == Some(owner_id))
            .cloned()
            .collect())
    }

    async fn delete_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError> {
        check_owner_field::<E>(field)?;
        let mut rows = self.write();
        let before = rows.len();
        rows.retain(|_, row| row.owner_id(field) != Some(owner_id));
        Ok((before - rows.len()) as u64)
    }

    async fn count_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError> {
        check_owner_field::<E>(field)?;
        Ok(self
            .read()
            .values()
            .filter(|row| row.owner_id(field) == Some(owner_id))
            .count() as u64)
    }

    async fn distinct_owners(&self, field: OwnerField) -> Result<Vec<i64>, DomainError> {
        check_owner_field::<E>(field)?;
        let mut owners: Vec<i64> = self
            .read()
            .values()
            .filter_map(|row| row.owner_id(field))
            .collect();
        owners.sort_unstable();
        owners.dedup();
        Ok(owners)
    }
}
