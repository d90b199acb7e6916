//! Entities owned by the Media service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socialnet_core::entity::{Entity, EntityKind, OwnerField};

/// Metadata of an uploaded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// Store-assigned identifier.
    pub media_id: i64,
    /// Uploader.
    pub user_id: i64,
    /// Post the media is attached to.
    #[serde(default)]
    pub post_id: Option<i64>,
    /// Key of the object in object storage.
    pub object_key: String,
    /// MIME type.
    pub content_type: String,
    /// Object size.
    pub size_bytes: u64,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

impl Entity for Media {
    const KIND: EntityKind = EntityKind::Media;
    const OWNER_FIELDS: &'static [OwnerField] = &[OwnerField::UserId, OwnerField::PostId];

    fn id(&self) -> i64 {
        self.media_id
    }

    fn with_id(self, media_id: i64) -> Self {
        Self { media_id, ..self }
    }

    fn owner_id(&self, field: OwnerField) -> Option<i64> {
        match field {
            OwnerField::UserId => Some(self.user_id),
            OwnerField::PostId => self.post_id,
            _ => None,
        }
    }

    fn partition_key(&self) -> i64 {
        self.user_id
    }
}

/// A media row together with the public URL of its object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaView {
    /// The stored metadata.
    #[serde(flatten)]
    pub media: Media,
    /// Where the object can be fetched.
    pub url: String,
}
