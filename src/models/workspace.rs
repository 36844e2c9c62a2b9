use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{image::ImageInput, required_text};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub invite_code: String,
    /// Creator of the workspace
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a workspace shown on the join page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub image: Option<ImageInput>,
}

impl CreateWorkspaceRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        Ok(Self {
            name: required_text("name", Some(self.name))?,
            image: self.image,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
    pub image: Option<ImageInput>,
}

impl UpdateWorkspaceRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        let name = match self.name {
            Some(name) => Some(required_text("name", Some(name))?),
            None => None,
        };
        Ok(Self { name, image: self.image })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinWorkspaceRequest {
    pub code: String,
}

impl JoinWorkspaceRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        Ok(Self { code: required_text("code", Some(self.code))? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        let err = CreateWorkspaceRequest { name: "   ".into(), image: None }.validate().unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["name"], "Required");

        let ok = CreateWorkspaceRequest { name: " Acme ".into(), image: None }.validate().unwrap();
        assert_eq!(ok.name, "Acme");
    }

    #[test]
    fn update_without_fields_is_allowed() {
        let req = UpdateWorkspaceRequest::default().validate().unwrap();
        assert!(req.name.is_none());
        assert!(req.image.is_none());
    }
}
