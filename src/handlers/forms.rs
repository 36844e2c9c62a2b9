use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::models::ImageInput;
use crate::storage::FileUpload;

/// Parsed multipart form: text fields and file parts by field name
#[derive(Debug, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    files: HashMap<String, FileUpload>,
}

impl FormFields {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormFields::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    // Browsers send an empty part when no file was picked
                    if bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(name, FileUpload { filename, content_type, bytes: bytes.to_vec() });
                }
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.text.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.text.get(name).cloned()
    }

    /// A file part wins over a text value of the same name
    pub fn image(&mut self, name: &str) -> Option<ImageInput> {
        if let Some(upload) = self.files.remove(name) {
            return Some(ImageInput::Upload(upload));
        }
        self.text.get(name).map(|value| ImageInput::from_text(value))
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Request body too large")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}
