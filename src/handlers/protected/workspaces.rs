use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};

use crate::handlers::forms::FormFields;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{
    CreateWorkspaceRequest, Deleted, JoinWorkspaceRequest, UpdateWorkspaceRequest, Workspace, WorkspaceInfo,
};
use crate::services::WorkspaceService;
use crate::state::AppState;
use crate::store::DocumentList;

/// GET /api/workspaces - Workspaces the caller belongs to, newest first
///
/// Never fails: a user without memberships, or a store outage, yields
/// `{ "documents": [], "total": 0 }`.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<DocumentList<Workspace>> {
    Ok(ApiResponse::success(WorkspaceService::new(&state).list_for_user(&user).await))
}

/// POST /api/workspaces - Create a workspace (multipart: name, image?)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Workspace> {
    let mut form = FormFields::read(multipart).await?;
    let request = CreateWorkspaceRequest {
        name: form.text("name").unwrap_or_default(),
        image: form.image("image"),
    };

    let workspace = WorkspaceService::new(&state).create(&user, request).await?;
    Ok(ApiResponse::success(workspace))
}

/// GET /api/workspaces/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(workspace_id): Path<String>,
) -> ApiResult<Workspace> {
    let workspace = WorkspaceService::new(&state).get(&user, &workspace_id).await?;
    Ok(ApiResponse::success(workspace))
}

/// GET /api/workspaces/:id/info - Name only, for the join page
pub async fn info(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
) -> ApiResult<WorkspaceInfo> {
    let info = WorkspaceService::new(&state).info(&workspace_id).await?;
    Ok(ApiResponse::success(info))
}

/// PATCH /api/workspaces/:id - Update name and/or image (admin only)
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(workspace_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Workspace> {
    let mut form = FormFields::read(multipart).await?;
    let request = UpdateWorkspaceRequest {
        name: form.text("name"),
        image: form.image("image"),
    };

    let workspace = WorkspaceService::new(&state).update(&user, &workspace_id, request).await?;
    Ok(ApiResponse::success(workspace))
}

/// DELETE /api/workspaces/:id - Delete with all tasks, projects and members (admin only)
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(workspace_id): Path<String>,
) -> ApiResult<Deleted> {
    let deleted = WorkspaceService::new(&state).delete(&user, &workspace_id).await?;
    Ok(ApiResponse::success(deleted))
}

/// POST /api/workspaces/:id/reset-invite-code (admin only)
pub async fn reset_invite_code(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(workspace_id): Path<String>,
) -> ApiResult<Workspace> {
    let workspace = WorkspaceService::new(&state)
        .reset_invite_code(&user, &workspace_id)
        .await?;
    Ok(ApiResponse::success(workspace))
}

/// POST /api/workspaces/:id/join - Join with an invite code
pub async fn join(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(workspace_id): Path<String>,
    Json(request): Json<JoinWorkspaceRequest>,
) -> ApiResult<Workspace> {
    let workspace = WorkspaceService::new(&state).join(&user, &workspace_id, request).await?;
    Ok(ApiResponse::success(workspace))
}
