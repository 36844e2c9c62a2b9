use serde_json::json;
use tracing::info;

use super::image::resolve_image;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::AuthUser;
use crate::models::{CreateProjectRequest, Deleted, Project, UpdateProjectRequest, WorkspaceQuery};
use crate::state::AppState;
use crate::store::{from_document, Collection, Document, DocumentList};

pub struct ProjectService<'a> {
    state: &'a AppState,
}

impl<'a> ProjectService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn create(&self, user: &AuthUser, request: CreateProjectRequest) -> Result<Project, ApiError> {
        let request = request.validate()?;
        let workspace_id = request.workspace_id.clone();

        self.state
            .gate()
            .run(user, &workspace_id, move |_| async move {
                let mut doc = Document::new();
                doc.insert("name".into(), json!(request.name));
                doc.insert("workspace_id".into(), json!(request.workspace_id));
                if let Some(image_url) = resolve_image(self.state, request.image).await? {
                    doc.insert("image_url".into(), image_url);
                }

                let project: Project =
                    from_document(self.state.store.create_document(Collection::Projects, doc).await?)?;
                info!("User {} created project {} in workspace {}", user.id, project.id, project.workspace_id);
                Ok(project)
            })
            .await
    }

    /// Projects of one workspace, newest first
    pub async fn list(&self, user: &AuthUser, query: WorkspaceQuery) -> Result<DocumentList<Project>, ApiError> {
        let workspace_id = query.workspace_id()?;

        self.state
            .gate()
            .run(user, &workspace_id, |_| async {
                let projects = self
                    .state
                    .store
                    .list_documents(
                        Collection::Projects,
                        FilterData::new()
                            .equal("workspace_id", workspace_id.as_str())
                            .order_desc("created_at"),
                    )
                    .await?;
                Ok(projects.into_typed()?)
            })
            .await
    }

    pub async fn get(&self, user: &AuthUser, project_id: &str) -> Result<Project, ApiError> {
        let project = self.fetch(project_id).await?;
        self.state.gate().authorize(user, &project.workspace_id).await?;
        Ok(project)
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        project_id: &str,
        request: UpdateProjectRequest,
    ) -> Result<Project, ApiError> {
        let request = request.validate()?;
        let project = self.fetch(project_id).await?;
        self.state.gate().authorize(user, &project.workspace_id).await?;

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
            .update_document(Collection::Projects, project_id, doc)
            .await?;
        Ok(from_document(updated)?)
    }

    /// Tasks keep their `project_id`; they simply stop resolving a project
    pub async fn delete(&self, user: &AuthUser, project_id: &str) -> Result<Deleted, ApiError> {
        let project = self.fetch(project_id).await?;
        self.state.gate().authorize(user, &project.workspace_id).await?;

        self.state
            .store
            .delete_document(Collection::Projects, project_id)
            .await?;
        Ok(Deleted { id: project.id })
    }

    async fn fetch(&self, project_id: &str) -> Result<Project, ApiError> {
        let doc = self
            .state
            .store
            .get_document(Collection::Projects, project_id)
            .await?;
        Ok(from_document(doc)?)
    }
}
