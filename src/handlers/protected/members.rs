use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Deleted, Member, UpdateMemberRequest, WorkspaceQuery};
use crate::services::MemberService;
use crate::state::AppState;
use crate::store::DocumentList;

/// GET /api/members?workspace_id=
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WorkspaceQuery>,
) -> ApiResult<DocumentList<Member>> {
    let members = MemberService::new(&state).list(&user, query).await?;
    Ok(ApiResponse::success(members))
}

/// DELETE /api/members/:id - Admins remove anyone, members remove themselves
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(member_id): Path<String>,
) -> ApiResult<Deleted> {
    let deleted = MemberService::new(&state).delete(&user, &member_id).await?;
    Ok(ApiResponse::success(deleted))
}

/// PATCH /api/members/:id - `{ "role": "ADMIN" | "MEMBER" }` (admin only)
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(member_id): Path<String>,
    Json(request): Json<UpdateMemberRequest>,
) -> ApiResult<Member> {
    let member = MemberService::new(&state).update_role(&user, &member_id, request).await?;
    Ok(ApiResponse::success(member))
}
