//! In-memory media store - used as fallback when no media root is writable
//! and by the handler test-suite.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use uuid::Uuid;

use scribe_core::forms::ImageUpload;
use scribe_core::ports::{MediaError, MediaStore};

/// Keeps uploads in a map keyed by their reference. Data is lost on process
/// restart.
#[derive(Default)]
pub struct InMemoryMediaStore {
    files: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, reference: &str) -> Option<Bytes> {
        self.files.read().await.get(reference).cloned()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn store(&self, upload: ImageUpload) -> Result<String, MediaError> {
        let format = upload
            .format()
            .ok_or_else(|| MediaError::UnsupportedFormat(upload.content_type.clone()))?;

        let reference = format!("posts/{}.{}", Uuid::new_v4(), format.extension());
        self.files
            .write()
            .await
            .insert(reference.clone(), upload.bytes);

        Ok(reference)
    }
}
