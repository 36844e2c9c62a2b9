use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::{describe, validate_name, FileStorage, FileUpload, StorageError, StoredFile};

/// Stores files under `{root}/{bucket}/{id}` with a `{id}.json` metadata sidecar
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        validate_name(bucket)?;
        Ok(self.root.join(bucket))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn create_file(&self, bucket: &str, upload: FileUpload) -> Result<StoredFile, StorageError> {
        let dir = self.bucket_dir(bucket)?;
        tokio::fs::create_dir_all(&dir).await?;

        let stored = describe(bucket, &upload);
        tokio::fs::write(dir.join(&stored.id), &upload.bytes).await?;
        tokio::fs::write(
            dir.join(format!("{}.json", stored.id)),
            serde_json::to_vec(&stored)?,
        )
        .await?;

        debug!("Stored file {}/{} ({} bytes)", bucket, stored.id, stored.size);
        Ok(stored)
    }

    async fn get_file(&self, bucket: &str, id: &str) -> Result<(StoredFile, Vec<u8>), StorageError> {
        let dir = self.bucket_dir(bucket)?;
        validate_name(id)?;

        let metadata = match tokio::fs::read(dir.join(format!("{}.json", id))).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound { bucket: bucket.to_string(), id: id.to_string() });
            }
            Err(e) => return Err(e.into()),
        };
        let stored: StoredFile = serde_json::from_slice(&metadata)?;
        let bytes = tokio::fs::read(dir.join(id)).await?;
        Ok((stored, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_reads_back_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let stored = storage
            .create_file(
                "images",
                FileUpload {
                    filename: "logo.png".into(),
                    content_type: "image/png".into(),
                    bytes: b"png-bytes".to_vec(),
                },
            )
            .await
            .unwrap();
        assert_eq!(stored.size, 9);

        let (meta, bytes) = storage.get_file("images", &stored.id).await.unwrap();
        assert_eq!(meta, stored);
        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());
        let err = storage.get_file("images", "nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());
        let err = storage.get_file("images", "../secret").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)));
    }
}
