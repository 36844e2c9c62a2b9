mod common;

use anyhow::Result;
use planboard_api::models::{
    BulkTaskUpdate, BulkUpdateTasksRequest, TaskListQuery, TaskStatus, UpdateTaskRequest,
};
use planboard_api::store::{Collection, DocumentStore};
use reqwest::StatusCode;
use serde_json::json;

async fn workspace_id(server: &common::TestServer, user_id: &str) -> Result<String> {
    let workspace = common::create_workspace(server, user_id, "Acme").await?;
    Ok(workspace["id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn positions_grow_per_status_column() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let ws = workspace_id(&server, "u1").await?;

    let first = common::create_task(&server, "u1", json!({ "name": "A", "status": "TODO", "workspace_id": ws, "due_date": "2026-11-01" })).await?;
    let second = common::create_task(&server, "u1", json!({ "name": "B", "status": "TODO", "workspace_id": ws, "due_date": "2026-11-02" })).await?;
    let other = common::create_task(&server, "u1", json!({ "name": "C", "status": "DONE", "workspace_id": ws, "due_date": "2026-11-03" })).await?;

    assert_eq!(first["position"], 1000);
    assert_eq!(second["position"], 2000);
    assert_eq!(other["position"], 1000);
    Ok(())
}

#[tokio::test]
async fn list_filters_are_combined() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let ws = workspace_id(&server, "u1").await?;
    let client = server.client("u1");
    let project = client.create_project(&ws, "Website", None).await?;

    for (name, status, project_id) in [
        ("Design homepage", "TODO", Some(project.id.as_str())),
        ("Design logo", "DONE", Some(project.id.as_str())),
        ("Write docs", "TODO", None),
    ] {
        common::create_task(
            &server,
            "u1",
            json!({ "name": name, "status": status, "workspace_id": ws, "due_date": "2026-11-01", "project_id": project_id }),
        )
        .await?;
    }

    let all = client.list_tasks(&TaskListQuery { workspace_id: Some(ws.clone()), ..Default::default() }).await?;
    assert_eq!(all.total, 3);

    let query = TaskListQuery {
        workspace_id: Some(ws.clone()),
        status: Some(TaskStatus::Todo),
        search: Some("design".into()),
        ..Default::default()
    };
    let filtered = client.list_tasks(&query).await?;
    assert_eq!(filtered.total, 1);
    assert_eq!(filtered.documents[0].task.name, "Design homepage");
    assert_eq!(filtered.documents[0].project.as_ref().map(|p| p.name.as_str()), Some("Website"));

    let by_project = TaskListQuery { workspace_id: Some(ws), project_id: Some(project.id), ..Default::default() };
    assert_eq!(client.list_tasks(&by_project).await?.total, 2);
    Ok(())
}

#[tokio::test]
async fn invalid_due_date_is_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let ws = workspace_id(&server, "u1").await?;

    let (status, body) = common::send(
        reqwest::Client::new()
            .post(server.url("/api/tasks"))
            .bearer_auth(server.token("u1"))
            .json(&json!({ "name": "A", "status": "TODO", "workspace_id": ws, "due_date": "someday" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["due_date"], "Expected a date");
    Ok(())
}

#[tokio::test]
async fn task_lifecycle_with_assignee() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let ws = workspace_id(&server, "u1").await?;
    let client = server.client("u1");
    let member = client.list_members(&ws).await?.documents.remove(0);

    let created = common::create_task(
        &server,
        "u1",
        json!({ "name": "Ship", "status": "BACKLOG", "workspace_id": ws, "due_date": "2026-11-01", "assignee_id": member.id }),
    )
    .await?;
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let populated = client.get_task(&id).await?;
    assert_eq!(populated.assignee.map(|m| m.user_id).as_deref(), Some("u1"));
    assert!(populated.project.is_none());

    let update = UpdateTaskRequest {
        status: Some(TaskStatus::InReview),
        assignee_id: Some(String::new()),
        ..Default::default()
    };
    let updated = client.update_task(&id, &update).await?;
    assert_eq!(updated.status, TaskStatus::InReview);
    assert!(updated.assignee_id.is_none());
    assert_eq!(updated.name, "Ship");

    client.delete_task(&id).await?;
    let err = client.get_task(&id).await.expect_err("task is gone");
    assert_eq!(err.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn non_member_cannot_touch_tasks() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let ws = workspace_id(&server, "u1").await?;
    let created = common::create_task(&server, "u1", json!({ "name": "A", "status": "TODO", "workspace_id": ws, "due_date": "2026-11-01" })).await?;
    let id = created["id"].as_str().unwrap_or_default();
    let outsider = server.client("u2");

    assert_eq!(outsider.get_task(id).await.err().and_then(|e| e.status()), Some(401));
    assert_eq!(outsider.delete_task(id).await.err().and_then(|e| e.status()), Some(401));

    let query = TaskListQuery { workspace_id: Some(ws), ..Default::default() };
    assert_eq!(outsider.list_tasks(&query).await.err().and_then(|e| e.status()), Some(401));
    assert!(server.client("u1").get_task(id).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn bulk_update_moves_tasks_between_columns() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let ws = workspace_id(&server, "u1").await?;
    let theirs = workspace_id(&server, "u2").await?;

    let a = common::create_task(&server, "u1", json!({ "name": "A", "status": "TODO", "workspace_id": ws, "due_date": "2026-11-01" })).await?;
    let b = common::create_task(&server, "u1", json!({ "name": "B", "status": "TODO", "workspace_id": ws, "due_date": "2026-11-01" })).await?;
    let foreign = common::create_task(&server, "u2", json!({ "name": "X", "status": "TODO", "workspace_id": theirs, "due_date": "2026-11-01" })).await?;

    let id = |task: &serde_json::Value| task["id"].as_str().unwrap_or_default().to_string();
    let client = server.client("u1");

    let request = BulkUpdateTasksRequest {
        tasks: vec![
            BulkTaskUpdate { id: id(&a), status: TaskStatus::InProgress, position: 1000 },
            BulkTaskUpdate { id: id(&b), status: TaskStatus::Todo, position: 500 },
        ],
    };
    let moved = client.bulk_update_tasks(&request).await?;
    assert_eq!(moved.len(), 2);
    assert_eq!(moved[0].status, TaskStatus::InProgress);
    assert_eq!(moved[1].position, 500);

    let mixed = BulkUpdateTasksRequest {
        tasks: vec![
            BulkTaskUpdate { id: id(&b), status: TaskStatus::Done, position: 1000 },
            BulkTaskUpdate { id: id(&foreign), status: TaskStatus::Done, position: 1000 },
        ],
    };
    let err = client.bulk_update_tasks(&mixed).await.expect_err("foreign task");
    assert_eq!(err.status(), Some(401));
    assert_eq!(client.get_task(&id(&b)).await?.task.status, TaskStatus::Todo);
    Ok(())
}

#[tokio::test]
async fn tasks_cannot_reference_another_workspace() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let mine = workspace_id(&server, "u1").await?;
    let theirs = workspace_id(&server, "victim").await?;

    let victim = server.client("victim");
    let secret = victim.create_project(&theirs, "Secret Roadmap", None).await?;
    let victim_member = victim.list_members(&theirs).await?.documents.remove(0);
    let client = reqwest::Client::new();

    for (field, value) in [("project_id", &secret.id), ("assignee_id", &victim_member.id)] {
        let mut body = json!({ "name": "Peek", "status": "TODO", "workspace_id": mine, "due_date": "2026-11-01" });
        body[field] = json!(value);
        let (status, body) = common::send(
            client
                .post(server.url("/api/tasks"))
                .bearer_auth(server.token("u1"))
                .json(&body),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"][field].is_string(), "{}", body);
    }

    let own = common::create_task(&server, "u1", json!({ "name": "Mine", "status": "TODO", "workspace_id": mine, "due_date": "2026-11-01" })).await?;
    let own_id = own["id"].as_str().unwrap_or_default();
    let update = UpdateTaskRequest { project_id: Some(secret.id.clone()), ..Default::default() };
    let err = server.client("u1").update_task(own_id, &update).await.expect_err("foreign project");
    assert_eq!(err.status(), Some(400));

    // References planted behind the API are still never resolved across workspaces
    let mut planted = serde_json::Map::new();
    planted.insert("project_id".into(), json!(secret.id));
    planted.insert("assignee_id".into(), json!(victim_member.id));
    server.store.update_document(Collection::Tasks, own_id, planted).await?;

    let populated = server.client("u1").get_task(own_id).await?;
    assert!(populated.project.is_none());
    assert!(populated.assignee.is_none());

    let query = TaskListQuery { workspace_id: Some(mine), ..Default::default() };
    let listed = server.client("u1").list_tasks(&query).await?;
    assert!(listed.documents.iter().all(|t| t.project.is_none() && t.assignee.is_none()));
    Ok(())
}
