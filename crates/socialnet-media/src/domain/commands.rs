//! Commands for the Media service.

use uuid::Uuid;

/// Command to upload a media object.
#[derive(Debug, Clone)]
pub struct UploadMedia {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Uploading user.
    pub user_id: i64,
    /// Post the media is attached to, if any.
    pub post_id: Option<i64>,
    /// MIME type of the bytes.
    pub content_type: String,
    /// Object contents.
    pub bytes: Vec<u8>,
}

/// Command to delete a media object.
#[derive(Debug, Clone)]
pub struct DeleteMedia {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The media identifier.
    pub media_id: i64,
}
