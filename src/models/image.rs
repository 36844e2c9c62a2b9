use crate::storage::FileUpload;

/// Image value submitted with a workspace or project form
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Binary file part; stored and replaced by its durable URL
    Upload(FileUpload),
    /// Existing URL kept as-is
    Url(String),
    /// Empty string: remove the image
    Clear,
}

impl ImageInput {
    /// Interprets a text form value
    pub fn from_text(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            ImageInput::Clear
        } else {
            ImageInput::Url(value.to_string())
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, ImageInput::Upload(_))
    }
}
