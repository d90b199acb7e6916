//! SocialNet Store — service-local persistence.
//!
//! Provides `PostgreSQL` and in-memory implementations of the `EntityStore`
//! trait defined in `socialnet-core`, plus in-memory object storage.

pub mod memory;
pub mod object_storage;
pub mod pg_entity_store;
pub mod schema;

pub use memory::InMemoryEntityStore;
pub use object_storage::InMemoryObjectStorage;
pub use pg_entity_store::PgEntityStore;
