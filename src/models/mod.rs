//! Typed documents and request shapes.

pub mod image;
pub mod member;
pub mod project;
pub mod task;
pub mod user;
pub mod workspace;

pub use image::ImageInput;
pub use member::{Member, MemberRole, UpdateMemberRequest};
pub use project::{CreateProjectRequest, Project, UpdateProjectRequest};
pub use task::{
    BulkTaskUpdate, BulkUpdateTasksRequest, CreateTaskRequest, PopulatedTask, Task, TaskListQuery, TaskStatus,
    UpdateTaskRequest, POSITION_STEP,
};
pub use user::User;
pub use workspace::{CreateWorkspaceRequest, JoinWorkspaceRequest, UpdateWorkspaceRequest, Workspace, WorkspaceInfo};

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// `?workspace_id=` on list routes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceQuery {
    pub workspace_id: Option<String>,
}

impl WorkspaceQuery {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self { workspace_id: Some(workspace_id.into()) }
    }

    /// The workspace to list, required
    pub fn workspace_id(&self) -> Result<String, ApiError> {
        required_text("workspace_id", self.workspace_id.clone())
    }
}

/// Body returned by delete routes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: String,
}

/// Trimmed non-empty text, or a field error naming `field`
pub(crate) fn required_text(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::field_error(field, "Required")),
    }
}

/// Trimmed text with blanks treated as absent
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
