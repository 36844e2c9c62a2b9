use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::cache::{query_key, QueryCache, QueryKey};
use super::notify::{Notification, Notifier};
use super::{ApiClient, ClientError};
use crate::models::{
    BulkUpdateTasksRequest, CreateTaskRequest, Deleted, ImageInput, Member, MemberRole, PopulatedTask, Project,
    Task, TaskListQuery, UpdateTaskRequest, User, Workspace, WorkspaceInfo,
};
use crate::store::DocumentList;

/// Outcome of a query as seen by a view
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Cached queries and notifying mutations over `ApiClient`.
///
/// Queries issue exactly one request per call and refresh the cache entry
/// under their key on success. A failed query leaves the previous entry in
/// place for readers of `cache()`. Mutations issue exactly one request,
/// then either notify success and invalidate the affected keys, or notify
/// the error message once. Nothing is retried or applied optimistically.
pub struct Hooks {
    client: ApiClient,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

impl Hooks {
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, cache: QueryCache::new(), notifier }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn query<T, Fut>(&self, key: QueryKey, fetch: Fut) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        match fetch.await {
            Ok(data) => {
                self.cache.insert(key, &data);
                QueryState::Success(data)
            }
            Err(e) => QueryState::Error(e.to_string()),
        }
    }

    async fn mutate<T, Fut>(&self, request: Fut, success: &str, invalidate: Vec<QueryKey>) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        match request.await {
            Ok(data) => {
                self.notifier.notify(Notification::Success(success.to_string()));
                for prefix in &invalidate {
                    self.cache.invalidate(prefix);
                }
                Ok(data)
            }
            Err(e) => {
                self.notifier.notify(Notification::Error(e.to_string()));
                Err(e)
            }
        }
    }

    // Queries

    pub async fn current(&self) -> QueryState<User> {
        self.query(query_key(["current"]), self.client.current_user()).await
    }

    pub async fn workspaces(&self) -> QueryState<DocumentList<Workspace>> {
        self.query(query_key(["workspaces"]), self.client.list_workspaces()).await
    }

    pub async fn workspace(&self, workspace_id: &str) -> QueryState<Workspace> {
        self.query(query_key(["workspace", workspace_id]), self.client.get_workspace(workspace_id))
            .await
    }

    pub async fn workspace_info(&self, workspace_id: &str) -> QueryState<WorkspaceInfo> {
        self.query(
            query_key(["workspace-info", workspace_id]),
            self.client.workspace_info(workspace_id),
        )
        .await
    }

    pub async fn projects(&self, workspace_id: &str) -> QueryState<DocumentList<Project>> {
        self.query(query_key(["projects", workspace_id]), self.client.list_projects(workspace_id))
            .await
    }

    pub async fn project(&self, project_id: &str) -> QueryState<Project> {
        self.query(query_key(["project", project_id]), self.client.get_project(project_id))
            .await
    }

    pub async fn tasks(&self, query: &TaskListQuery) -> QueryState<DocumentList<PopulatedTask>> {
        let filters = serde_json::to_string(query).unwrap_or_default();
        let workspace_id = query.workspace_id.clone().unwrap_or_default();
        self.query(query_key(["tasks".to_string(), workspace_id, filters]), self.client.list_tasks(query))
            .await
    }

    pub async fn task(&self, task_id: &str) -> QueryState<PopulatedTask> {
        self.query(query_key(["task", task_id]), self.client.get_task(task_id)).await
    }

    pub async fn members(&self, workspace_id: &str) -> QueryState<DocumentList<Member>> {
        self.query(query_key(["members", workspace_id]), self.client.list_members(workspace_id))
            .await
    }

    // Workspace mutations

    pub async fn create_workspace(&self, name: &str, image: Option<ImageInput>) -> Result<Workspace, ClientError> {
        self.mutate(
            self.client.create_workspace(name, image),
            "Workspace created",
            vec![query_key(["workspaces"])],
        )
        .await
    }

    pub async fn update_workspace(
        &self,
        workspace_id: &str,
        name: Option<&str>,
        image: Option<ImageInput>,
    ) -> Result<Workspace, ClientError> {
        self.mutate(
            self.client.update_workspace(workspace_id, name, image),
            "Workspace updated",
            vec![query_key(["workspaces"]), query_key(["workspace", workspace_id])],
        )
        .await
    }

    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<Deleted, ClientError> {
        self.mutate(
            self.client.delete_workspace(workspace_id),
            "Workspace deleted",
            vec![query_key(["workspaces"]), query_key(["workspace", workspace_id])],
        )
        .await
    }

    pub async fn reset_invite_code(&self, workspace_id: &str) -> Result<Workspace, ClientError> {
        self.mutate(
            self.client.reset_invite_code(workspace_id),
            "Invite code reset",
            vec![query_key(["workspaces"]), query_key(["workspace", workspace_id])],
        )
        .await
    }

    pub async fn join_workspace(&self, workspace_id: &str, code: &str) -> Result<Workspace, ClientError> {
        self.mutate(
            self.client.join_workspace(workspace_id, code),
            "Joined workspace",
            vec![query_key(["workspaces"]), query_key(["workspace", workspace_id])],
        )
        .await
    }

    // Project mutations

    pub async fn create_project(
        &self,
        workspace_id: &str,
        name: &str,
        image: Option<ImageInput>,
    ) -> Result<Project, ClientError> {
        self.mutate(
            self.client.create_project(workspace_id, name, image),
            "Project created",
            vec![query_key(["projects"])],
        )
        .await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        name: Option<&str>,
        image: Option<ImageInput>,
    ) -> Result<Project, ClientError> {
        self.mutate(
            self.client.update_project(project_id, name, image),
            "Project updated",
            vec![query_key(["projects"]), query_key(["project", project_id])],
        )
        .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<Deleted, ClientError> {
        self.mutate(
            self.client.delete_project(project_id),
            "Project deleted",
            vec![query_key(["projects"]), query_key(["project", project_id]), query_key(["tasks"])],
        )
        .await
    }

    // Task mutations

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ClientError> {
        self.mutate(self.client.create_task(request), "Task created", vec![query_key(["tasks"])])
            .await
    }

    pub async fn update_task(&self, task_id: &str, request: &UpdateTaskRequest) -> Result<Task, ClientError> {
        self.mutate(
            self.client.update_task(task_id, request),
            "Task updated",
            vec![query_key(["tasks"]), query_key(["task", task_id])],
        )
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<Deleted, ClientError> {
        self.mutate(
            self.client.delete_task(task_id),
            "Task deleted",
            vec![query_key(["tasks"]), query_key(["task", task_id])],
        )
        .await
    }

    pub async fn bulk_update_tasks(&self, request: &BulkUpdateTasksRequest) -> Result<Vec<Task>, ClientError> {
        let mut invalidate = vec![query_key(["tasks"])];
        invalidate.extend(request.tasks.iter().map(|t| query_key(["task", t.id.as_str()])));
        self.mutate(self.client.bulk_update_tasks(request), "Tasks updated", invalidate)
            .await
    }

    // Member mutations

    pub async fn delete_member(&self, member_id: &str) -> Result<Deleted, ClientError> {
        self.mutate(
            self.client.delete_member(member_id),
            "Member removed",
            vec![query_key(["members"])],
        )
        .await
    }

    pub async fn update_member(&self, member_id: &str, role: MemberRole) -> Result<Member, ClientError> {
        self.mutate(
            self.client.update_member(member_id, role),
            "Member updated",
            vec![query_key(["members"])],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RecordingNotifier;

    #[tokio::test]
    async fn queries_request_even_when_cached() {
        // Nothing listens on this port, so the request fails
        let hooks = Hooks::new(ApiClient::new("http://127.0.0.1:9"), Arc::new(RecordingNotifier::new()));
        let key = query_key(["workspace-info", "w1"]);
        let info = WorkspaceInfo { name: "Acme".into() };
        hooks.cache().insert(key.clone(), &info);

        assert!(hooks.workspace_info("w1").await.error().is_some());
        assert_eq!(hooks.cache().get::<WorkspaceInfo>(&key), Some(info));
    }

    #[tokio::test]
    async fn failed_mutation_notifies_once_and_keeps_cache() {
        let notifier = Arc::new(RecordingNotifier::new());
        let hooks = Hooks::new(ApiClient::new("http://127.0.0.1:9"), notifier.clone());
        hooks.cache().insert(query_key(["tasks", "w1", "{}"]), &1);

        assert!(hooks.delete_task("t1").await.is_err());

        let seen = notifier.notifications();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0], Notification::Error(_)));
        assert_eq!(hooks.cache().len(), 1);
    }
}
