use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::models::ImageInput;
use crate::state::AppState;
use crate::storage::validate_image;

/// Public URL under which a stored file is served
pub fn file_url(public_url: &str, bucket: &str, file_id: &str) -> Result<String, ApiError> {
    let path = format!("files/{}/{}", bucket, file_id);
    if public_url.is_empty() {
        return Ok(format!("/{}", path));
    }

    let base = url::Url::parse(&format!("{}/", public_url.trim_end_matches('/')))
        .map_err(|e| ApiError::internal_server_error(format!("Invalid public URL: {}", e)))?;
    let url = base
        .join(&path)
        .map_err(|e| ApiError::internal_server_error(format!("Invalid file URL: {}", e)))?;
    Ok(url.to_string())
}

/// Value to store in `image_url`: `None` leaves the field untouched, `Null`
/// clears it. Only a binary upload touches file storage.
pub async fn resolve_image(state: &AppState, image: Option<ImageInput>) -> Result<Option<Value>, ApiError> {
    match image {
        None => Ok(None),
        Some(ImageInput::Clear) => Ok(Some(Value::Null)),
        Some(ImageInput::Url(url)) => Ok(Some(Value::String(url))),
        Some(ImageInput::Upload(upload)) => {
            let storage = &state.config.storage;
            validate_image(&upload, storage.max_image_bytes)?;

            let stored = state.storage.create_file(&storage.images_bucket, upload).await?;
            info!("Uploaded image {}/{} ({} bytes)", stored.bucket, stored.id, stored.size);

            let url = file_url(&state.config.api.public_url, &stored.bucket, &stored.id)?;
            Ok(Some(Value::String(url)))
        }
    }
}
