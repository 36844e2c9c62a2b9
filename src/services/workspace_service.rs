use serde_json::{json, Value};
use tracing::{error, info};

use super::image::resolve_image;
use super::invite::generate_invite_code;
use super::membership::find_membership;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::AuthUser;
use crate::models::{
    CreateWorkspaceRequest, Deleted, JoinWorkspaceRequest, Member, MemberRole, UpdateWorkspaceRequest, Workspace,
    WorkspaceInfo,
};
use crate::state::AppState;
use crate::store::{from_document, Collection, Document, DocumentList, StoreError};

pub struct WorkspaceService<'a> {
    state: &'a AppState,
}

impl<'a> WorkspaceService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Workspaces the caller belongs to, newest first. Store failures are
    /// logged and reported as an empty list.
    pub async fn list_for_user(&self, user: &AuthUser) -> DocumentList<Workspace> {
        match self.try_list_for_user(user).await {
            Ok(list) => list,
            Err(e) => {
                error!("Failed to list workspaces for user {}: {}", user.id, e);
                DocumentList::empty()
            }
        }
    }

    async fn try_list_for_user(&self, user: &AuthUser) -> Result<DocumentList<Workspace>, StoreError> {
        let members = self
            .state
            .store
            .list_documents(Collection::Members, FilterData::new().equal("user_id", user.id.as_str()))
            .await?;

        if members.documents.is_empty() {
            return Ok(DocumentList::empty());
        }

        let workspace_ids: Vec<Value> = members
            .documents
            .iter()
            .filter_map(|m| m.get("workspace_id").cloned())
            .collect();

        self.state
            .store
            .list_documents(
                Collection::Workspaces,
                FilterData::new().contains("id", workspace_ids).order_desc("created_at"),
            )
            .await?
            .into_typed()
    }

    /// Creates the workspace and makes the caller its admin
    pub async fn create(&self, user: &AuthUser, request: CreateWorkspaceRequest) -> Result<Workspace, ApiError> {
        let request = request.validate()?;
        let image_url = resolve_image(self.state, request.image).await?;

        let mut doc = Document::new();
        doc.insert("name".into(), json!(request.name));
        doc.insert("user_id".into(), json!(user.id));
        doc.insert(
            "invite_code".into(),
            json!(generate_invite_code(self.state.config.workspace.invite_code_length)),
        );
        if let Some(image_url) = image_url {
            doc.insert("image_url".into(), image_url);
        }

        let workspace: Workspace =
            from_document(self.state.store.create_document(Collection::Workspaces, doc).await?)?;
        self.add_member(user, &workspace.id, MemberRole::Admin).await?;

        info!("User {} created workspace {}", user.id, workspace.id);
        Ok(workspace)
    }

    pub async fn get(&self, user: &AuthUser, workspace_id: &str) -> Result<Workspace, ApiError> {
        self.state.gate().authorize(user, workspace_id).await?;
        self.fetch(workspace_id).await
    }

    /// Name only, readable by anyone holding the link
    pub async fn info(&self, workspace_id: &str) -> Result<WorkspaceInfo, ApiError> {
        let workspace = self.fetch(workspace_id).await?;
        Ok(WorkspaceInfo { name: workspace.name })
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        workspace_id: &str,
        request: UpdateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        let request = request.validate()?;
        self.state.gate().authorize_admin(user, workspace_id).await?;

        let mut doc = Document::new();
        if let Some(name) = request.name {
            doc.insert("name".into(), json!(name));
        }
        if let Some(image_url) = resolve_image(self.state, request.image).await? {
            doc.insert("image_url".into(), image_url);
        }

        let updated = self
            .state
            .store
            .update_document(Collection::Workspaces, workspace_id, doc)
            .await?;
        Ok(from_document(updated)?)
    }

    /// Deletes the workspace together with its tasks, projects and members
    pub async fn delete(&self, user: &AuthUser, workspace_id: &str) -> Result<Deleted, ApiError> {
        self.state.gate().authorize_admin(user, workspace_id).await?;

        for collection in [Collection::Tasks, Collection::Projects, Collection::Members] {
            self.delete_scoped(collection, workspace_id).await?;
        }
        self.state
            .store
            .delete_document(Collection::Workspaces, workspace_id)
            .await?;

        info!("User {} deleted workspace {}", user.id, workspace_id);
        Ok(Deleted { id: workspace_id.to_string() })
    }

    /// Replaces the invite code; the previous code stops working at once
    pub async fn reset_invite_code(&self, user: &AuthUser, workspace_id: &str) -> Result<Workspace, ApiError> {
        self.state.gate().authorize_admin(user, workspace_id).await?;

        let mut doc = Document::new();
        doc.insert(
            "invite_code".into(),
            json!(generate_invite_code(self.state.config.workspace.invite_code_length)),
        );
        let updated = self
            .state
            .store
            .update_document(Collection::Workspaces, workspace_id, doc)
            .await?;
        Ok(from_document(updated)?)
    }

    pub async fn join(
        &self,
        user: &AuthUser,
        workspace_id: &str,
        request: JoinWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        let request = request.validate()?;

        if find_membership(self.state.store.as_ref(), &user.id, workspace_id).await?.is_some() {
            return Err(ApiError::bad_request("Already a member"));
        }

        let workspace = self.fetch(workspace_id).await?;
        if workspace.invite_code != request.code {
            return Err(ApiError::bad_request("Invalid invite code"));
        }

        self.add_member(user, workspace_id, MemberRole::Member).await?;
        info!("User {} joined workspace {}", user.id, workspace_id);
        Ok(workspace)
    }

    async fn fetch(&self, workspace_id: &str) -> Result<Workspace, ApiError> {
        let doc = self
            .state
            .store
            .get_document(Collection::Workspaces, workspace_id)
            .await?;
        Ok(from_document(doc)?)
    }

    async fn add_member(&self, user: &AuthUser, workspace_id: &str, role: MemberRole) -> Result<Member, ApiError> {
        let mut doc = Document::new();
        doc.insert("user_id".into(), json!(user.id));
        doc.insert("workspace_id".into(), json!(workspace_id));
        doc.insert("role".into(), json!(role));
        doc.insert("name".into(), json!(user.name));
        doc.insert("email".into(), json!(user.email));

        let member = self.state.store.create_document(Collection::Members, doc).await?;
        Ok(from_document(member)?)
    }

    /// Deletes every document of `collection` in the workspace, page by page
    async fn delete_scoped(&self, collection: Collection, workspace_id: &str) -> Result<(), ApiError> {
        loop {
            let page = self
                .state
                .store
                .list_documents(collection, FilterData::new().equal("workspace_id", workspace_id))
                .await?;
            if page.documents.is_empty() {
                return Ok(());
            }
            for doc in page.documents {
                if let Some(id) = doc.get("id").and_then(Value::as_str) {
                    self.state.store.delete_document(collection, id).await?;
                }
            }
        }
    }
}
