//! Binary-attachment port - the seam to the media collaborator.

use async_trait::async_trait;

use crate::forms::ImageUpload;

/// Stores image payloads and hands back a retrievable reference.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist an upload; the returned reference is what a post's `image`
    /// field carries.
    async fn store(&self, upload: ImageUpload) -> Result<String, MediaError>;
}

/// Media storage errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    #[error("Media storage failed: {0}")]
    Io(String),
}
