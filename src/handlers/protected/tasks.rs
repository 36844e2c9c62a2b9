use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{BulkUpdateTasksRequest, CreateTaskRequest, Deleted, PopulatedTask, Task, TaskListQuery, UpdateTaskRequest};
use crate::services::TaskService;
use crate::state::AppState;
use crate::store::DocumentList;

/// GET /api/tasks - Filter by workspace_id (required), project_id,
/// assignee_id, status, due_date and search; all filters are ANDed
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<DocumentList<PopulatedTask>> {
    let tasks = TaskService::new(&state).list(&user, query).await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/tasks
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<Task> {
    let task = TaskService::new(&state).create(&user, request).await?;
    Ok(ApiResponse::success(task))
}

/// GET /api/tasks/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> ApiResult<PopulatedTask> {
    let task = TaskService::new(&state).get(&user, &task_id).await?;
    Ok(ApiResponse::success(task))
}

/// PATCH /api/tasks/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> ApiResult<Task> {
    let task = TaskService::new(&state).update(&user, &task_id, request).await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/tasks/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> ApiResult<Deleted> {
    let deleted = TaskService::new(&state).delete(&user, &task_id).await?;
    Ok(ApiResponse::success(deleted))
}

/// POST /api/tasks/bulk-update - `{ "tasks": [{ "id", "status", "position" }] }`
pub async fn bulk_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BulkUpdateTasksRequest>,
) -> ApiResult<Vec<Task>> {
    let tasks = TaskService::new(&state).bulk_update(&user, request).await?;
    Ok(ApiResponse::success(tasks))
}
