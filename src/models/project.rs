use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{image::ImageInput, required_text};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub workspace_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProjectRequest {
    pub name: String,
    pub image: Option<ImageInput>,
    pub workspace_id: String,
}

impl CreateProjectRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        Ok(Self {
            name: required_text("name", Some(self.name))?,
            image: self.image,
            workspace_id: required_text("workspace_id", Some(self.workspace_id))?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub image: Option<ImageInput>,
}

impl UpdateProjectRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        let name = match self.name {
            Some(name) => Some(required_text("name", Some(name))?),
            None => None,
        };
        Ok(Self { name, image: self.image })
    }
}
