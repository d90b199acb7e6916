//! In-memory object storage used by the media service.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use socialnet_core::error::DomainError;
use socialnet_core::store::ObjectStorage;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Raw object bytes.
    pub bytes: Vec<u8>,
    /// MIME type supplied at upload.
    pub content_type: String,
}

/// Object storage held in process memory.
#[derive(Debug)]
pub struct InMemoryObjectStorage {
    base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStorage {
    /// Creates an empty storage whose URLs start with `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// The object under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), DomainError> {
        self.objects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(
                key.to_owned(),
                StoredObject {
                    bytes,
                    content_type: content_type.to_owned(),
                },
            );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.objects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }
}
