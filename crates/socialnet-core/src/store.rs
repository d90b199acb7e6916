//! Collaborator interfaces consumed by the propagation layer: a service's
//! local relational store and the object storage client.

use async_trait::async_trait;

use crate::entity::{Entity, OwnerField};
use crate::error::DomainError;

/// A service-local store of rows of one entity type.
///
/// Each call is its own local transaction. Deletes are "delete if exists":
/// removing a row that is already gone is not an error.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Inserts a new row and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if a row with the same
    /// `E::UNIQUE_OWNERS` values already exists.
    async fn insert(&self, entity: E) -> Result<E, DomainError>;

    /// Replaces an existing row.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no row has the entity's id.
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Loads a row by id.
    async fn find(&self, id: i64) -> Result<Option<E>, DomainError>;

    /// Whether a row with this id exists.
    async fn exists(&self, id: i64) -> Result<bool, DomainError>;

    /// Deletes a row by id, returning it if it existed.
    async fn delete(&self, id: i64) -> Result<Option<E>, DomainError>;

    /// Rows whose `field` equals `owner_id`, ordered by id.
    async fn find_by_owner(&self, field: OwnerField, owner_id: i64)
    -> Result<Vec<E>, DomainError>;

    /// Deletes the rows with the given ids in one transaction, returning how
    /// many were removed. Ids that are already gone are skipped.
    async fn delete_many(&self, ids: &[i64]) -> Result<u64, DomainError>;

    /// Rows matching every `(field, owner_id)` pair, ordered by id.
    async fn find_by_owners(&self, owners: &[(OwnerField, i64)]) -> Result<Vec<E>, DomainError>;

    /// Deletes every row whose `field` equals `owner_id` in one transaction,
    /// returning how many were removed.
    async fn delete_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError>;

    /// Number of rows whose `field` equals `owner_id`.
    async fn count_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError>;

    /// Distinct non-null values of `field`, ascending.
    async fn distinct_owners(&self, field: OwnerField) -> Result<Vec<i64>, DomainError>;
}

/// Ensures `field` is one of `E`'s owner columns.
///
/// # Errors
///
/// Returns `DomainError::Validation` otherwise.
pub fn check_owner_field<E: Entity>(field: OwnerField) -> Result<(), DomainError> {
    if E::OWNER_FIELDS.contains(&field) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "{} has no owner field {field}",
            E::KIND
        )))
    }
}

/// Values of `E::UNIQUE_OWNERS` on `entity`, or `None` when `E` has no
/// uniqueness rule.
#[must_use]
pub fn unique_owner_key<E: Entity>(entity: &E) -> Option<Vec<Option<i64>>> {
    if E::UNIQUE_OWNERS.is_empty() {
        return None;
    }
    Some(
        E::UNIQUE_OWNERS
            .iter()
            .map(|field| entity.owner_id(*field))
            .collect(),
    )
}

/// The conflict reported when an insert would duplicate `E::UNIQUE_OWNERS`.
#[must_use]
pub fn duplicate_owners<E: Entity>(entity: &E) -> DomainError {
    let owners: Vec<String> = E::UNIQUE_OWNERS
        .iter()
        .map(|field| match entity.owner_id(*field) {
            Some(id) => format!("{field}={id}"),
            None => format!("{field}=null"),
        })
        .collect();
    DomainError::Conflict(format!("{} with {} already exists", E::KIND, owners.join(", ")))
}

/// Object storage client used by the media service.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), DomainError>;

    /// Deletes the object under `key`. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), DomainError>;

    /// Public URL of the object under `key`.
    fn url(&self, key: &str) -> String;
}
