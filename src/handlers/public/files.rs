use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /files/:bucket/:id - Raw file bytes with their stored content type
pub async fn get(
    State(state): State<AppState>,
    Path((bucket, file_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (stored, bytes) = state.storage.get_file(&bucket, &file_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, stored.content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::CONTENT_SECURITY_POLICY, "default-src 'none'; sandbox".to_string()),
        ],
        bytes,
    ))
}
