//! `PostgreSQL` implementation of the `EntityStore` trait.

use std::marker::PhantomData;

use async_trait::async_trait;
use socialnet_core::entity::{Entity, OwnerField};
use socialnet_core::error::DomainError;
use socialnet_core::store::{EntityStore, check_owner_field, duplicate_owners};
use sqlx::PgPool;

use crate::schema::EntityStatements;

fn db_error(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code == "23505"),
        _ => false,
    }
}

fn decode<E: Entity>((id, data): (i64, serde_json::Value)) -> Result<E, DomainError> {
    serde_json::from_value::<E>(data)
        .map(|entity| entity.with_id(id))
        .map_err(|e| DomainError::Infrastructure(format!("{} row {id} decoding failed: {e}", E::KIND)))
}

fn encode<E: Entity>(entity: &E) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(entity)
        .map_err(|e| DomainError::Infrastructure(format!("{} encoding failed: {e}", E::KIND)))
}

/// PostgreSQL-backed store for one entity table.
#[derive(Debug, Clone)]
pub struct PgEntityStore<E> {
    pool: PgPool,
    statements: EntityStatements,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgEntityStore<E> {
    /// Creates a new `PgEntityStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statements: EntityStatements::new(E::KIND, E::OWNER_FIELDS),
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for PgEntityStore<E> {
    async fn insert(&self, entity: E) -> Result<E, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let mut query = sqlx::query_scalar::<_, i64>(&self.statements.insert);
        for field in E::OWNER_FIELDS {
            query = query.bind(entity.owner_id(*field));
        }
        let id = match query.bind(encode(&entity)?).fetch_one(&mut *tx).await {
            Ok(id) => id,
            Err(err) if is_unique_violation(&err) => return Err(duplicate_owners(&entity)),
            Err(err) => return Err(db_error(err)),
        };

        // The snapshot was written before the id existed.
        let entity = entity.with_id(id);
        sqlx::query(&self.statements.set_data)
            .bind(encode(&entity)?)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let mut query = sqlx::query(&self.statements.update);
        for field in E::OWNER_FIELDS {
            query = query.bind(entity.owner_id(*field));
        }
        let result = query
            .bind(encode(&entity)?)
            .bind(entity.id())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound {
                kind: E::KIND,
                id: entity.id(),
            });
        }
        Ok(entity)
    }

    async fn find(&self, id: i64) -> Result<Option<E>, DomainError> {
        sqlx::query_as::<_, (i64, serde_json::Value)>(&self.statements.select)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(decode)
            .transpose()
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>(&self.statements.exists)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn delete(&self, id: i64) -> Result<Option<E>, DomainError> {
        sqlx::query_as::<_, (i64, serde_json::Value)>(&self.statements.delete)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(decode)
            .transpose()
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64, DomainError> {
        let result = sqlx::query(&self.statements.delete_many())
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn find_by_owners(&self, owners: &[(OwnerField, i64)]) -> Result<Vec<E>, DomainError> {
        let fields: Vec<OwnerField> = owners.iter().map(|(field, _)| *field).collect();
        for field in &fields {
            check_owner_field::<E>(*field)?;
        }
        let sql = self.statements.find_by_owners(&fields);
        let mut query = sqlx::query_as::<_, (i64, serde_json::Value)>(&sql);
        for (_, owner_id) in owners {
            query = query.bind(*owner_id);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn find_by_owner(
        &self,
        field: OwnerField,
        owner_id: i64,
    ) -> Result<Vec<E>, DomainError> {
        check_owner_field::<E>(field)?;
        let sql = self.statements.find_by_owner(field);
        sqlx::query_as::<_, (i64, serde_json::Value)>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn delete_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError> {
        check_owner_field::<E>(field)?;
        let sql = self.statements.delete_by_owner(field);
        let result = sqlx::query(&sql)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        tracing::debug!(
            kind = %E::KIND,
            field = %field,
            owner_id,
            deleted = result.rows_affected(),
            "deleted rows by owner"
        );
        Ok(result.rows_affected())
    }

    async fn count_by_owner(&self, field: OwnerField, owner_id: i64) -> Result<u64, DomainError> {
        check_owner_field::<E>(field)?;
        let sql = self.statements.count_by_owner(field);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn distinct_owners(&self, field: OwnerField) -> Result<Vec<i64>, DomainError> {
        check_owner_field::<E>(field)?;
        let sql = self.statements.distinct_owners(field);
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }
}
