//! File storage for uploaded images.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use local::LocalFileStorage;
pub use memory::MemoryFileStorage;

/// A file received from a client, not yet stored
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Metadata of a stored file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub bucket: String,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub checksum: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File {bucket}/{id} not found")]
    NotFound { bucket: String, id: String },

    #[error("Unsupported content type: {0}")]
    InvalidContentType(String),

    #[error("File is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn create_file(&self, bucket: &str, upload: FileUpload) -> Result<StoredFile, StorageError>;

    async fn get_file(&self, bucket: &str, id: &str) -> Result<(StoredFile, Vec<u8>), StorageError>;
}

/// Raster formats accepted for workspace and project images. SVG is left
/// out since it can carry script and files are served from the API origin.
pub const IMAGE_CONTENT_TYPES: [&str; 5] = ["image/png", "image/jpeg", "image/gif", "image/webp", "image/avif"];

/// Rejects anything that is not a raster image within `max_bytes`
pub fn validate_image(upload: &FileUpload, max_bytes: usize) -> Result<(), StorageError> {
    let content_type = upload.content_type.trim().to_ascii_lowercase();
    if !IMAGE_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(StorageError::InvalidContentType(upload.content_type.clone()));
    }
    if upload.bytes.len() > max_bytes {
        return Err(StorageError::TooLarge { size: upload.bytes.len(), limit: max_bytes });
    }
    Ok(())
}

/// Bucket names and file ids become path segments, so only `[A-Za-z0-9_-]`
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

pub(crate) fn checksum(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub(crate) fn describe(bucket: &str, upload: &FileUpload) -> StoredFile {
    StoredFile {
        id: crate::store::new_document_id(),
        bucket: bucket.to_string(),
        filename: upload.filename.clone(),
        content_type: upload.content_type.clone(),
        size: upload.bytes.len(),
        checksum: checksum(&upload.bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, len: usize) -> FileUpload {
        FileUpload {
            filename: "logo.png".into(),
            content_type: content_type.into(),
            bytes: vec![7; len],
        }
    }

    #[test]
    fn images_must_be_image_content_types() {
        assert!(validate_image(&upload("image/png", 10), 100).is_ok());
        assert!(matches!(
            validate_image(&upload("text/plain", 10), 100),
            Err(StorageError::InvalidContentType(_))
        ));
        assert!(matches!(
            validate_image(&upload("image/svg+xml", 10), 100),
            Err(StorageError::InvalidContentType(_))
        ));
        assert!(validate_image(&upload("IMAGE/WEBP", 10), 100).is_ok());
    }

    #[test]
    fn images_respect_size_limit() {
        assert!(matches!(
            validate_image(&upload("image/jpeg", 101), 100),
            Err(StorageError::TooLarge { size: 101, limit: 100 })
        ));
    }

    #[test]
    fn names_cannot_escape_the_bucket() {
        assert!(validate_name("images").is_ok());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn checksum_is_sha256_hex() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
