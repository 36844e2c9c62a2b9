use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{describe, validate_name, FileStorage, FileUpload, StorageError, StoredFile};

/// In-process file storage keyed by `(bucket, id)`
#[derive(Default)]
pub struct MemoryFileStorage {
    files: RwLock<HashMap<(String, String), (StoredFile, Vec<u8>)>>,
}

impl MemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn create_file(&self, bucket: &str, upload: FileUpload) -> Result<StoredFile, StorageError> {
        validate_name(bucket)?;
        let stored = describe(bucket, &upload);
        self.files
            .write()
            .await
            .insert((bucket.to_string(), stored.id.clone()), (stored.clone(), upload.bytes));
        Ok(stored)
    }

    async fn get_file(&self, bucket: &str, id: &str) -> Result<(StoredFile, Vec<u8>), StorageError> {
        self.files
            .read()
            .await
            .get(&(bucket.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound { bucket: bucket.to_string(), id: id.to_string() })
    }
}
