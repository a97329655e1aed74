//! Filesystem-backed media store.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use scribe_core::forms::ImageUpload;
use scribe_core::ports::{MediaError, MediaStore};

/// Writes uploads beneath a media root and hands back the relative path as
/// the stored reference.
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn store(&self, upload: ImageUpload) -> Result<String, MediaError> {
        let format = upload
            .format()
            .ok_or_else(|| MediaError::UnsupportedFormat(upload.content_type.clone()))?;

        // Uploads get a fresh name; the client's filename is never trusted
        // as a path.
        let name = format!("{}.{}", Uuid::new_v4(), format.extension());
        let dir = self.root.join("posts");

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;
        tokio::fs::write(dir.join(&name), &upload.bytes)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        tracing::debug!(reference = %name, "Stored media upload");
        Ok(format!("posts/{name}"))
    }
}
