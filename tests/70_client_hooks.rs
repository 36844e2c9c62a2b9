mod common;

use std::sync::Arc;

use anyhow::Result;
use planboard_api::client::cache::query_key;
use planboard_api::client::view::{kanban_columns, EditWorkspaceForm};
use planboard_api::client::{Hooks, Notification, QueryState, RecordingNotifier};
use planboard_api::models::{CreateTaskRequest, TaskListQuery, TaskStatus};
use planboard_api::store::memory::StoreOpKind;
use planboard_api::store::Collection;

#[tokio::test]
async fn queries_refetch_and_mutations_invalidate() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let notifier = Arc::new(RecordingNotifier::new());
    let hooks = Hooks::new(server.client("u1"), notifier.clone());

    let workspace = hooks.create_workspace("Acme", None).await?;
    let query = TaskListQuery { workspace_id: Some(workspace.id.clone()), ..Default::default() };

    let first = hooks.tasks(&query).await;
    assert_eq!(first.data().map(|l| l.total), Some(0));
    let lists = server.count(StoreOpKind::List, Collection::Tasks);

    // Every invocation goes to the server
    let key = query_key(["tasks".to_string(), workspace.id.clone(), serde_json::to_string(&query)?]);
    assert!(hooks.cache().contains(&key));
    hooks.tasks(&query).await;
    assert_eq!(server.count(StoreOpKind::List, Collection::Tasks), lists + 1);

    let request = CreateTaskRequest {
        name: "Ship".into(),
        status: TaskStatus::Todo,
        workspace_id: workspace.id.clone(),
        due_date: "2026-11-01".into(),
        project_id: None,
        assignee_id: None,
        description: None,
    };
    let task = hooks.create_task(&request).await?;
    assert!(!hooks.cache().contains(&key));

    let refreshed = hooks.tasks(&query).await;
    let tasks = refreshed.data().map(|l| l.documents.clone()).unwrap_or_default();
    assert_eq!(tasks.len(), 1);
    assert_eq!(kanban_columns(&tasks)[&TaskStatus::Todo][0].task.id, task.id);

    assert_eq!(
        notifier.notifications(),
        vec![
            Notification::Success("Workspace created".into()),
            Notification::Success("Task created".into()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn failed_mutation_reports_server_message() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let workspace = common::create_workspace(&server, "owner", "Acme").await?;
    let notifier = Arc::new(RecordingNotifier::new());
    let hooks = Hooks::new(server.client("stranger"), notifier.clone());

    let result = hooks
        .create_project(workspace["id"].as_str().unwrap_or_default(), "Nope", None)
        .await;
    assert!(result.is_err());
    assert_eq!(notifier.notifications(), vec![Notification::Error("Unauthorized".into())]);

    let state = hooks.workspace(workspace["id"].as_str().unwrap_or_default()).await;
    assert_eq!(state, QueryState::Error("Unauthorized".into()));
    Ok(())
}

#[tokio::test]
async fn edit_form_tracks_invite_reset() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let hooks = Hooks::new(server.client("u1"), Arc::new(RecordingNotifier::new()));
    let workspace = hooks.create_workspace("Acme", None).await?;

    let mut form = EditWorkspaceForm::new(workspace.clone());
    let old_link = form.invite_link("https://plan.example");

    form.reset_dialog.open();
    form.reset_dialog.confirm();
    if form.reset_dialog.outcome() == Some(true) {
        let reset = hooks.reset_invite_code(&workspace.id).await?;
        form.refresh(reset);
    }

    assert_ne!(form.invite_link("https://plan.example"), old_link);
    assert!(!form.reset_dialog.is_open());
    Ok(())
}

#[tokio::test]
async fn deleting_a_task_invalidates_list_and_detail() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let hooks = Hooks::new(server.client("u1"), Arc::new(RecordingNotifier::new()));
    let workspace = hooks.create_workspace("Acme", None).await?;
    let created = common::create_task(
        &server,
        "u1",
        serde_json::json!({ "name": "Ship", "status": "TODO", "workspace_id": workspace.id, "due_date": "2026-11-01" }),
    )
    .await?;
    let task_id = created["id"].as_str().unwrap_or_default().to_string();

    let query = TaskListQuery { workspace_id: Some(workspace.id.clone()), ..Default::default() };
    assert!(hooks.tasks(&query).await.data().is_some());
    assert!(hooks.task(&task_id).await.data().is_some());

    hooks.delete_task(&task_id).await?;
    assert!(!hooks.cache().contains(&query_key(["task", task_id.as_str()])));

    assert_eq!(hooks.tasks(&query).await.data().map(|l| l.total), Some(0));
    assert!(matches!(hooks.task(&task_id).await, QueryState::Error(_)));
    Ok(())
}
