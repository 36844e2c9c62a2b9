use std::collections::{BTreeSet, HashMap};

use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::AuthUser;
use crate::models::{
    BulkUpdateTasksRequest, CreateTaskRequest, Deleted, Member, PopulatedTask, Project, Task, TaskListQuery,
    TaskStatus, UpdateTaskRequest, POSITION_STEP,
};
use crate::state::AppState;
use crate::store::{from_document, Collection, Document, DocumentList, StoreError};

pub struct TaskService<'a> {
    state: &'a AppState,
}

impl<'a> TaskService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Tasks matching every supplied filter, with project and assignee resolved
    pub async fn list(&self, user: &AuthUser, query: TaskListQuery) -> Result<DocumentList<PopulatedTask>, ApiError> {
        let workspace_id = query.workspace_id()?;
        self.state.gate().authorize(user, &workspace_id).await?;

        let tasks: DocumentList<Task> = self
            .state
            .store
            .list_documents(Collection::Tasks, query.to_filter(&workspace_id))
            .await?
            .into_typed()?;

        Ok(self.populate(&workspace_id, tasks).await?)
    }

    /// New tasks go after the last task in their status column
    pub async fn create(&self, user: &AuthUser, request: CreateTaskRequest) -> Result<Task, ApiError> {
        let request = request.validate()?;
        self.state.gate().authorize(user, &request.workspace_id).await?;
        self.check_references(
            &request.workspace_id,
            request.project_id.as_deref(),
            request.assignee_id.as_deref(),
        )
        .await?;

        let position = self.next_position(&request.workspace_id, request.status).await?;
        let doc = request.into_document(position);
        let task: Task = from_document(self.state.store.create_document(Collection::Tasks, doc).await?)?;

        info!("User {} created task {} in workspace {}", user.id, task.id, task.workspace_id);
        Ok(task)
    }

    pub async fn get(&self, user: &AuthUser, task_id: &str) -> Result<PopulatedTask, ApiError> {
        let task = self.fetch(task_id).await?;
        self.state.gate().authorize(user, &task.workspace_id).await?;

        let project = match &task.project_id {
            Some(id) => self
                .fetch_optional::<Project>(Collection::Projects, id)
                .await?
                .filter(|p| p.workspace_id == task.workspace_id),
            None => None,
        };
        let assignee = match &task.assignee_id {
            Some(id) => self
                .fetch_optional::<Member>(Collection::Members, id)
                .await?
                .filter(|m| m.workspace_id == task.workspace_id),
            None => None,
        };
        Ok(PopulatedTask { task, project, assignee })
    }

    pub async fn update(&self, user: &AuthUser, task_id: &str, request: UpdateTaskRequest) -> Result<Task, ApiError> {
        let request = request.validate()?;
        let task = self.fetch(task_id).await?;
        self.state.gate().authorize(user, &task.workspace_id).await?;
        self.check_references(
            &task.workspace_id,
            request.project_id.as_deref().map(str::trim).filter(|id| !id.is_empty()),
            request.assignee_id.as_deref().map(str::trim).filter(|id| !id.is_empty()),
        )
        .await?;

        let updated = self
            .state
            .store
            .update_document(Collection::Tasks, task_id, request.into_document())
            .await?;
        Ok(from_document(updated)?)
    }

    pub async fn delete(&self, user: &AuthUser, task_id: &str) -> Result<Deleted, ApiError> {
        let task = self.fetch(task_id).await?;
        self.state.gate().authorize(user, &task.workspace_id).await?;

        self.state.store.delete_document(Collection::Tasks, task_id).await?;
        Ok(Deleted { id: task.id })
    }

    /// Moves tasks between kanban columns. The caller must belong to every
    /// workspace touched before anything is written.
    pub async fn bulk_update(&self, user: &AuthUser, request: BulkUpdateTasksRequest) -> Result<Vec<Task>, ApiError> {
        let request = request.validate()?;

        let mut workspaces = BTreeSet::new();
        for update in &request.tasks {
            workspaces.insert(self.fetch(&update.id).await?.workspace_id);
        }
        for workspace_id in &workspaces {
            self.state.gate().authorize(user, workspace_id).await?;
        }

        let mut updated = Vec::with_capacity(request.tasks.len());
        for update in request.tasks {
            let mut doc = Document::new();
            doc.insert("status".into(), json!(update.status));
            doc.insert("position".into(), json!(update.position));
            let task = self
                .state
                .store
                .update_document(Collection::Tasks, &update.id, doc)
                .await?;
            updated.push(from_document(task)?);
        }
        Ok(updated)
    }

    /// A task may only point at a project and an assignee of its own workspace
    async fn check_references(
        &self,
        workspace_id: &str,
        project_id: Option<&str>,
        assignee_id: Option<&str>,
    ) -> Result<(), ApiError> {
        if let Some(id) = project_id {
            let project = self.fetch_optional::<Project>(Collection::Projects, id).await?;
            if !matches!(&project, Some(p) if p.workspace_id == workspace_id) {
                warn!("Rejected project {} for a task in workspace {}", id, workspace_id);
                return Err(ApiError::field_error("project_id", "Not a project of this workspace"));
            }
        }
        if let Some(id) = assignee_id {
            let member = self.fetch_optional::<Member>(Collection::Members, id).await?;
            if !matches!(&member, Some(m) if m.workspace_id == workspace_id) {
                warn!("Rejected assignee {} for a task in workspace {}", id, workspace_id);
                return Err(ApiError::field_error("assignee_id", "Not a member of this workspace"));
            }
        }
        Ok(())
    }

    async fn next_position(&self, workspace_id: &str, status: TaskStatus) -> Result<i64, ApiError> {
        let highest = self
            .state
            .store
            .list_documents(
                Collection::Tasks,
                FilterData::new()
                    .equal("workspace_id", workspace_id)
                    .equal("status", status.as_str())
                    .order_desc("position")
                    .limit(1),
            )
            .await?;

        let position = highest
            .documents
            .first()
            .and_then(|doc| doc.get("position"))
            .and_then(|p| p.as_i64())
            .map(|p| p + POSITION_STEP)
            .unwrap_or(POSITION_STEP);
        Ok(position)
    }

    async fn populate(
        &self,
        workspace_id: &str,
        tasks: DocumentList<Task>,
    ) -> Result<DocumentList<PopulatedTask>, StoreError> {
        let project_ids: BTreeSet<String> = tasks.documents.iter().filter_map(|t| t.project_id.clone()).collect();
        let assignee_ids: BTreeSet<String> = tasks.documents.iter().filter_map(|t| t.assignee_id.clone()).collect();

        let projects: HashMap<String, Project> = self.fetch_many(Collection::Projects, workspace_id, project_ids).await?;
        let assignees: HashMap<String, Member> = self.fetch_many(Collection::Members, workspace_id, assignee_ids).await?;

        Ok(tasks.map(|task| PopulatedTask {
            project: task.project_id.as_ref().and_then(|id| projects.get(id).cloned()),
            assignee: task.assignee_id.as_ref().and_then(|id| assignees.get(id).cloned()),
            task,
        }))
    }

    /// Documents of `workspace_id` by id, skipping the query when there is nothing to resolve
    async fn fetch_many<T>(
        &self,
        collection: Collection,
        workspace_id: &str,
        ids: BTreeSet<String>,
    ) -> Result<HashMap<String, T>, StoreError>
    where
        T: serde::de::DeserializeOwned,
    {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let docs = self
            .state
            .store
            .list_documents(
                collection,
                FilterData::new().contains("id", ids).equal("workspace_id", workspace_id),
            )
            .await?;

        let mut found = HashMap::new();
        for doc in docs.documents {
            if let Some(id) = doc.get("id").and_then(|v| v.as_str()).map(str::to_string) {
                found.insert(id, from_document(doc)?);
            }
        }
        Ok(found)
    }

    async fn fetch_optional<T>(&self, collection: Collection, id: &str) -> Result<Option<T>, StoreError>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.state.store.get_document(collection, id).await {
            Ok(doc) => Ok(Some(from_document(doc)?)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch(&self, task_id: &str) -> Result<Task, ApiError> {
        let doc = self.state.store.get_document(Collection::Tasks, task_id).await?;
        Ok(from_document(doc)?)
    }
}
