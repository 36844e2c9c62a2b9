use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::AuthUser;
use crate::models::{Deleted, Member, MemberRole, UpdateMemberRequest, WorkspaceQuery};
use crate::state::AppState;
use crate::store::{from_document, Collection, Document, DocumentList};

pub struct MemberService<'a> {
    state: &'a AppState,
}

impl<'a> MemberService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self, user: &AuthUser, query: WorkspaceQuery) -> Result<DocumentList<Member>, ApiError> {
        let workspace_id = query.workspace_id()?;
        self.state.gate().authorize(user, &workspace_id).await?;
        Ok(self.workspace_members(&workspace_id).await?)
    }

    /// Admins may remove anyone; members may remove themselves
    pub async fn delete(&self, user: &AuthUser, member_id: &str) -> Result<Deleted, ApiError> {
        let target = self.fetch(member_id).await?;
        let caller = self.state.gate().authorize(user, &target.workspace_id).await?;

        if caller.id != target.id && !caller.is_admin() {
            warn!("User {} may not remove member {}", user.id, member_id);
            return Err(ApiError::unauthorized("Unauthorized"));
        }
        let members = self.workspace_members(&target.workspace_id).await?;
        if members.total <= 1 {
            return Err(ApiError::bad_request("Cannot delete the only member"));
        }
        if target.is_admin() && self.admin_count(&target.workspace_id).await? <= 1 {
            return Err(ApiError::bad_request("Cannot delete the last admin"));
        }

        self.state.store.delete_document(Collection::Members, member_id).await?;
        info!("Removed member {} from workspace {}", member_id, target.workspace_id);
        Ok(Deleted { id: target.id })
    }

    pub async fn update_role(
        &self,
        user: &AuthUser,
        member_id: &str,
        request: UpdateMemberRequest,
    ) -> Result<Member, ApiError> {
        let target = self.fetch(member_id).await?;
        self.state.gate().authorize_admin(user, &target.workspace_id).await?;

        if request.role == MemberRole::Member && target.is_admin() {
            let members = self.workspace_members(&target.workspace_id).await?;
            if members.total <= 1 {
                return Err(ApiError::bad_request("Cannot downgrade the only member"));
            }
            if self.admin_count(&target.workspace_id).await? <= 1 {
                return Err(ApiError::bad_request("Cannot downgrade the last admin"));
            }
        }

        let mut doc = Document::new();
        doc.insert("role".into(), json!(request.role));
        let updated = self
            .state
            .store
            .update_document(Collection::Members, member_id, doc)
            .await?;
        Ok(from_document(updated)?)
    }

    async fn workspace_members(&self, workspace_id: &str) -> Result<DocumentList<Member>, ApiError> {
        let members = self
            .state
            .store
            .list_documents(
                Collection::Members,
                FilterData::new()
                    .equal("workspace_id", workspace_id)
                    .order_asc("created_at"),
            )
            .await?;
        Ok(members.into_typed()?)
    }

    async fn admin_count(&self, workspace_id: &str) -> Result<usize, ApiError> {
        let admins = self
            .state
            .store
            .list_documents(
                Collection::Members,
                FilterData::new()
                    .equal("workspace_id", workspace_id)
                    .equal("role", MemberRole::Admin.as_str())
                    .limit(1),
            )
            .await?;
        Ok(admins.total)
    }

    async fn fetch(&self, member_id: &str) -> Result<Member, ApiError> {
        let doc = self.state.store.get_document(Collection::Members, member_id).await?;
        Ok(from_document(doc)?)
    }
}
