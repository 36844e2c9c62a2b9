use axum::{
    extract::{Multipart, Path, Query, State},
    Extension,
};

use crate::handlers::forms::FormFields;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{CreateProjectRequest, Deleted, Project, UpdateProjectRequest, WorkspaceQuery};
use crate::services::ProjectService;
use crate::state::AppState;
use crate::store::DocumentList;

/// POST /api/projects - Create a project (multipart: name, image?, workspace_id)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Project> {
    let mut form = FormFields::read(multipart).await?;
    let request = CreateProjectRequest {
        name: form.text("name").unwrap_or_default(),
        workspace_id: form.text("workspace_id").unwrap_or_default(),
        image: form.image("image"),
    };

    let project = ProjectService::new(&state).create(&user, request).await?;
    Ok(ApiResponse::success(project))
}

/// GET /api/projects?workspace_id= - Projects of a workspace, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WorkspaceQuery>,
) -> ApiResult<DocumentList<Project>> {
    let projects = ProjectService::new(&state).list(&user, query).await?;
    Ok(ApiResponse::success(projects))
}

/// GET /api/projects/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<String>,
) -> ApiResult<Project> {
    let project = ProjectService::new(&state).get(&user, &project_id).await?;
    Ok(ApiResponse::success(project))
}

/// PATCH /api/projects/:id (multipart: name?, image?)
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Project> {
    let mut form = FormFields::read(multipart).await?;
    let request = UpdateProjectRequest {
        name: form.text("name"),
        image: form.image("image"),
    };

    let project = ProjectService::new(&state).update(&user, &project_id, request).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<String>,
) -> ApiResult<Deleted> {
    let deleted = ProjectService::new(&state).delete(&user, &project_id).await?;
    Ok(ApiResponse::success(deleted))
}
