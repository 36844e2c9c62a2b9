//! Typed HTTP client for the API plus the client-side data hooks and view
//! state built on it.

pub mod cache;
pub mod hooks;
pub mod notify;
pub mod view;

use reqwest::{multipart, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{
    BulkUpdateTasksRequest, CreateTaskRequest, Deleted, ImageInput, Member, MemberRole, PopulatedTask, Project,
    Task, TaskListQuery, UpdateTaskRequest, User, Workspace, WorkspaceInfo,
};
use crate::store::DocumentList;

pub use cache::{QueryCache, QueryKey};
pub use hooks::{Hooks, QueryState};
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::InvalidResponse(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Client for one API server, optionally authenticated with a bearer token
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            // Extractor rejections come back as plain text
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api { status: status.as_u16(), code: None, message: text });
            }
            Err(e) => return Err(ClientError::InvalidResponse(e.to_string())),
        };

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let envelope: Envelope<T> =
            serde_json::from_value(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(envelope.data)
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        self.send(self.request(Method::GET, "/health")).await
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.send(self.request(Method::GET, "/api/auth/current")).await
    }

    // Workspaces

    pub async fn list_workspaces(&self) -> Result<DocumentList<Workspace>, ClientError> {
        self.send(self.request(Method::GET, "/api/workspaces")).await
    }

    pub async fn get_workspace(&self, workspace_id: &str) -> Result<Workspace, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/workspaces/{}", workspace_id)))
            .await
    }

    pub async fn workspace_info(&self, workspace_id: &str) -> Result<WorkspaceInfo, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/workspaces/{}/info", workspace_id)))
            .await
    }

    pub async fn create_workspace(&self, name: &str, image: Option<ImageInput>) -> Result<Workspace, ClientError> {
        let form = image_form(multipart::Form::new().text("name", name.to_string()), image)?;
        self.send(self.request(Method::POST, "/api/workspaces").multipart(form))
            .await
    }

    pub async fn update_workspace(
        &self,
        workspace_id: &str,
        name: Option<&str>,
        image: Option<ImageInput>,
    ) -> Result<Workspace, ClientError> {
        let mut form = multipart::Form::new();
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }
        let form = image_form(form, image)?;
        self.send(
            self.request(Method::PATCH, &format!("/api/workspaces/{}", workspace_id))
                .multipart(form),
        )
        .await
    }

    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<Deleted, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/api/workspaces/{}", workspace_id)))
            .await
    }

    pub async fn reset_invite_code(&self, workspace_id: &str) -> Result<Workspace, ClientError> {
        self.send(self.request(
            Method::POST,
            &format!("/api/workspaces/{}/reset-invite-code", workspace_id),
        ))
        .await
    }

    pub async fn join_workspace(&self, workspace_id: &str, code: &str) -> Result<Workspace, ClientError> {
        self.send(
            self.request(Method::POST, &format!("/api/workspaces/{}/join", workspace_id))
                .json(&json!({ "code": code })),
        )
        .await
    }

    // Projects

    pub async fn list_projects(&self, workspace_id: &str) -> Result<DocumentList<Project>, ClientError> {
        self.send(
            self.request(Method::GET, "/api/projects")
                .query(&[("workspace_id", workspace_id)]),
        )
        .await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/projects/{}", project_id)))
            .await
    }

    pub async fn create_project(
        &self,
        workspace_id: &str,
        name: &str,
        image: Option<ImageInput>,
    ) -> Result<Project, ClientError> {
        let form = multipart::Form::new()
            .text("name", name.to_string())
            .text("workspace_id", workspace_id.to_string());
        let form = image_form(form, image)?;
        self.send(self.request(Method::POST, "/api/projects").multipart(form))
            .await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        name: Option<&str>,
        image: Option<ImageInput>,
    ) -> Result<Project, ClientError> {
        let mut form = multipart::Form::new();
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }
        let form = image_form(form, image)?;
        self.send(
            self.request(Method::PATCH, &format!("/api/projects/{}", project_id))
                .multipart(form),
        )
        .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<Deleted, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/api/projects/{}", project_id)))
            .await
    }

    // Tasks

    pub async fn list_tasks(&self, query: &TaskListQuery) -> Result<DocumentList<PopulatedTask>, ClientError> {
        self.send(self.request(Method::GET, "/api/tasks").query(query)).await
    }

    pub async fn get_task(&self, task_id: &str) -> Result<PopulatedTask, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/tasks/{}", task_id)))
            .await
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ClientError> {
        self.send(self.request(Method::POST, "/api/tasks").json(request)).await
    }

    pub async fn update_task(&self, task_id: &str, request: &UpdateTaskRequest) -> Result<Task, ClientError> {
        self.send(
            self.request(Method::PATCH, &format!("/api/tasks/{}", task_id))
                .json(request),
        )
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<Deleted, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/api/tasks/{}", task_id)))
            .await
    }

    pub async fn bulk_update_tasks(&self, request: &BulkUpdateTasksRequest) -> Result<Vec<Task>, ClientError> {
        self.send(self.request(Method::POST, "/api/tasks/bulk-update").json(request))
            .await
    }

    // Members

    pub async fn list_members(&self, workspace_id: &str) -> Result<DocumentList<Member>, ClientError> {
        self.send(
            self.request(Method::GET, "/api/members")
                .query(&[("workspace_id", workspace_id)]),
        )
        .await
    }

    pub async fn delete_member(&self, member_id: &str) -> Result<Deleted, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/api/members/{}", member_id)))
            .await
    }

    pub async fn update_member(&self, member_id: &str, role: MemberRole) -> Result<Member, ClientError> {
        self.send(
            self.request(Method::PATCH, &format!("/api/members/{}", member_id))
                .json(&UpdateMemberBody { role }),
        )
        .await
    }
}

#[derive(Serialize)]
struct UpdateMemberBody {
    role: MemberRole,
}

fn api_error(status: StatusCode, body: &Value) -> ClientError {
    ClientError::Api {
        status: status.as_u16(),
        code: body.get("code").and_then(Value::as_str).map(str::to_string),
        message: body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed"))
            .to_string(),
    }
}

/// Adds the `image` field: a file part for uploads, text otherwise
fn image_form(form: multipart::Form, image: Option<ImageInput>) -> Result<multipart::Form, ClientError> {
    Ok(match image {
        None => form,
        Some(ImageInput::Clear) => form.text("image", ""),
        Some(ImageInput::Url(url)) => form.text("image", url),
        Some(ImageInput::Upload(upload)) => {
            let part = multipart::Part::bytes(upload.bytes)
                .file_name(upload.filename)
                .mime_str(&upload.content_type)?;
            form.part("image", part)
        }
    })
}
