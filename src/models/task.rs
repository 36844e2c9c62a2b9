use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{member::Member, optional_text, project::Project, required_text};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::store::Document;

/// Gap left between neighbouring task positions in a column
pub const POSITION_STEP: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    InReview,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "BACKLOG",
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::InReview => "IN_REVIEW",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown task status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub workspace_id: String,
    pub project_id: Option<String>,
    /// Member id, not user id
    pub assignee_id: Option<String>,
    pub status: TaskStatus,
    pub due_date: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task with its project and assignee resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulatedTask {
    #[serde(flatten)]
    pub task: Task,
    pub project: Option<Project>,
    pub assignee: Option<Member>,
}

fn validate_due_date(value: String) -> Result<String, ApiError> {
    let value = required_text("due_date", Some(value))?;
    let parses = DateTime::parse_from_rfc3339(&value).is_ok()
        || NaiveDate::parse_from_str(&value, "%Y-%m-%d").is_ok();
    if !parses {
        return Err(ApiError::field_error("due_date", "Expected a date"));
    }
    Ok(value)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub status: TaskStatus,
    pub workspace_id: String,
    pub due_date: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateTaskRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        Ok(Self {
            name: required_text("name", Some(self.name))?,
            status: self.status,
            workspace_id: required_text("workspace_id", Some(self.workspace_id))?,
            due_date: validate_due_date(self.due_date)?,
            project_id: optional_text(self.project_id),
            assignee_id: optional_text(self.assignee_id),
            description: optional_text(self.description),
        })
    }

    /// Document to insert at `position`
    pub fn into_document(self, position: i64) -> Document {
        let mut doc = Document::new();
        doc.insert("name".into(), json!(self.name));
        doc.insert("status".into(), json!(self.status));
        doc.insert("workspace_id".into(), json!(self.workspace_id));
        doc.insert("due_date".into(), json!(self.due_date));
        doc.insert("project_id".into(), json!(self.project_id));
        doc.insert("assignee_id".into(), json!(self.assignee_id));
        doc.insert("description".into(), json!(self.description));
        doc.insert("position".into(), json!(position));
        doc
    }
}

/// Partial task update. For nullable fields an empty string clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

impl UpdateTaskRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        let name = match self.name {
            Some(name) => Some(required_text("name", Some(name))?),
            None => None,
        };
        let due_date = match self.due_date {
            Some(date) => Some(validate_due_date(date)?),
            None => None,
        };
        if matches!(self.position, Some(p) if p < 0) {
            return Err(ApiError::field_error("position", "Must not be negative"));
        }
        Ok(Self { name, due_date, ..self })
    }

    pub fn into_document(self) -> Document {
        let nullable = |value: String| -> Value {
            match optional_text(Some(value)) {
                Some(v) => json!(v),
                None => Value::Null,
            }
        };

        let mut doc = Document::new();
        if let Some(name) = self.name {
            doc.insert("name".into(), json!(name));
        }
        if let Some(status) = self.status {
            doc.insert("status".into(), json!(status));
        }
        if let Some(due_date) = self.due_date {
            doc.insert("due_date".into(), json!(due_date));
        }
        if let Some(project_id) = self.project_id {
            doc.insert("project_id".into(), nullable(project_id));
        }
        if let Some(assignee_id) = self.assignee_id {
            doc.insert("assignee_id".into(), nullable(assignee_id));
        }
        if let Some(description) = self.description {
            doc.insert("description".into(), nullable(description));
        }
        if let Some(position) = self.position {
            doc.insert("position".into(), json!(position));
        }
        doc
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskListQuery {
    pub workspace_id: Option<String>,
    pub project_id: Option<String>,
    pub assignee_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<String>,
    pub search: Option<String>,
}

impl TaskListQuery {
    pub fn workspace_id(&self) -> Result<String, ApiError> {
        required_text("workspace_id", self.workspace_id.clone())
    }

    /// AND of every supplied filter, newest first
    pub fn to_filter(&self, workspace_id: &str) -> FilterData {
        let mut filter = FilterData::new().equal("workspace_id", workspace_id);
        if let Some(project_id) = optional_text(self.project_id.clone()) {
            filter = filter.equal("project_id", project_id);
        }
        if let Some(assignee_id) = optional_text(self.assignee_id.clone()) {
            filter = filter.equal("assignee_id", assignee_id);
        }
        if let Some(status) = self.status {
            filter = filter.equal("status", status.as_str());
        }
        if let Some(due_date) = optional_text(self.due_date.clone()) {
            filter = filter.equal("due_date", due_date);
        }
        if let Some(search) = optional_text(self.search.clone()) {
            filter = filter.search("name", &search);
        }
        filter.order_desc("created_at")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkTaskUpdate {
    pub id: String,
    pub status: TaskStatus,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateTasksRequest {
    pub tasks: Vec<BulkTaskUpdate>,
}

impl BulkUpdateTasksRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        if self.tasks.is_empty() {
            return Err(ApiError::field_error("tasks", "Required"));
        }
        if self.tasks.iter().any(|t| t.position < 0) {
            return Err(ApiError::field_error("position", "Must not be negative"));
        }
        Ok(self)
    }
}
