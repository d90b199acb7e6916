//! Table layout and SQL statements for entity tables.
//!
//! Every entity table has the same shape: a `BIGSERIAL` id, one nullable
//! `BIGINT` column per owner field (indexed, never a foreign key: owners live
//! in other services), and a `data JSONB` snapshot of the row.

use socialnet_core::entity::{EntityKind, OwnerField};

/// Table holding rows of `kind`.
#[must_use]
pub const fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users",
        EntityKind::Post => "posts",
        EntityKind::Comment => "comments",
        EntityKind::PostLike => "post_likes",
        EntityKind::CommentLike => "comment_likes",
        EntityKind::Media => "media",
        EntityKind::Notification => "notifications",
        EntityKind::Subscription => "subscriptions",
    }
}

/// Pre-rendered statements for one entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityStatements {
    table: &'static str,
    /// `INSERT ... RETURNING id`; binds the owner columns then `data`.
    pub insert: String,
    /// `UPDATE ...`; binds the owner columns, `data`, then `id`.
    pub update: String,
    /// Rewrites only `data`; binds `data` then `id`.
    pub set_data: String,
    /// Selects `(id, data)` by id.
    pub select: String,
    /// Selects whether a row with the id exists.
    pub exists: String,
    /// Deletes by id, returning `(id, data)`.
    pub delete: String,
}

impl EntityStatements {
    /// Renders the statements for a table with the given owner columns.
    #[must_use]
    pub fn new(kind: EntityKind, owner_fields: &[OwnerField]) -> Self {
        let table = table_name(kind);
        let columns: Vec<&str> = owner_fields.iter().map(|f| f.column()).collect();

        let mut insert_columns = columns.clone();
        insert_columns.push("data");
        let placeholders: Vec<String> = (1..=insert_columns.len()).map(|i| format!("${i}")).collect();
        let insert = format!(
            "INSERT INTO {table} ({}) VALUES ({}) RETURNING id",
            insert_columns.join(", "),
            placeholders.join(", ")
        );

        let assignments: Vec<String> = insert_columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ${}", i + 1))
            .collect();
        let update = format!(
            "UPDATE {table} SET {} WHERE id = ${}",
            assignments.join(", "),
            insert_columns.len() + 1
        );

        Self {
            table,
            insert,
            update,
            set_data: format!("UPDATE {table} SET data = $1 WHERE id = $2"),
            select: format!("SELECT id, data FROM {table} WHERE id = $1"),
            exists: format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)"),
            delete: format!("DELETE FROM {table} WHERE id = $1 RETURNING id, data"),
        }
    }

    /// Selects `(id, data)` of rows whose `field` equals `$1`.
    #[must_use]
    pub fn find_by_owner(&self, field: OwnerField) -> String {
        format!(
            "SELECT id, data FROM {} WHERE {} = $1 ORDER BY id",
            self.table,
            field.column()
        )
    }

    /// Selects `(id, data)` of rows matching every field, binding one value
    /// per field in order.
    #[must_use]
    pub fn find_by_owners(&self, fields: &[OwnerField]) -> String {
        let conditions: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, field)| format!("{} = ${}", field.column(), i + 1))
            .collect();
        let filter = if conditions.is_empty() {
            "TRUE".to_owned()
        } else {
            conditions.join(" AND ")
        };
        format!("SELECT id, data FROM {} WHERE {filter} ORDER BY id", self.table)
    }

    /// Deletes the rows whose id is in the `$1` array.
    #[must_use]
    pub fn delete_many(&self) -> String {
        format!("DELETE FROM {} WHERE id = ANY($1)", self.table)
    }

    /// Deletes rows whose `field` equals `$1`.
    #[must_use]
    pub fn delete_by_owner(&self, field: OwnerField) -> String {
        format!("DELETE FROM {} WHERE {} = $1", self.table, field.column())
    }

    /// Counts rows whose `field` equals `$1`.
    #[must_use]
    pub fn count_by_owner(&self, field: OwnerField) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            self.table,
            field.column()
        )
    }

    /// Distinct non-null values of `field`.
    #[must_use]
    pub fn distinct_owners(&self, field: OwnerField) -> String {
        let column = field.column();
        format!(
            "SELECT DISTINCT {column} FROM {} WHERE {column} IS NOT NULL ORDER BY {column}",
            self.table
        )
    }
}
