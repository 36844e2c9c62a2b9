mod common;

use anyhow::Result;
use planboard_api::store::memory::StoreOpKind;
use planboard_api::store::Collection;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn user_without_memberships_gets_empty_list_from_one_query() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    common::create_workspace(&server, "owner", "Acme").await?;
    server.store.clear_operations();

    let (status, body) = common::send(
        reqwest::Client::new()
            .get(server.url("/api/workspaces"))
            .bearer_auth(server.token("stranger")),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "documents": [], "total": 0 }));
    assert_eq!(server.count(StoreOpKind::List, Collection::Members), 1);
    assert_eq!(server.count(StoreOpKind::List, Collection::Workspaces), 0);
    Ok(())
}

#[tokio::test]
async fn creator_becomes_admin_and_sees_only_own_workspaces() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let w1 = common::create_workspace(&server, "u1", "First").await?;
    common::create_workspace(&server, "u2", "Other").await?;
    assert_eq!(w1["invite_code"].as_str().map(str::len), Some(6));

    let client = server.client("u1");
    let list = client.list_workspaces().await?;
    assert_eq!(list.total, 1);
    assert_eq!(list.documents[0].name, "First");

    let members = client.list_members(w1["id"].as_str().unwrap_or_default()).await?;
    assert_eq!(members.total, 1);
    assert!(members.documents[0].is_admin());
    assert_eq!(members.documents[0].user_id, "u1");
    Ok(())
}

#[tokio::test]
async fn non_member_cannot_read_workspace() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let w1 = common::create_workspace(&server, "u1", "Mine").await?;
    let w2 = common::create_workspace(&server, "u2", "Theirs").await?;
    let client = reqwest::Client::new();

    let (status, _) = common::send(
        client
            .get(server.url(&format!("/api/workspaces/{}", w1["id"].as_str().unwrap_or_default())))
            .bearer_auth(server.token("u1")),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = common::send(
        client
            .get(server.url(&format!("/api/workspaces/{}", w2["id"].as_str().unwrap_or_default())))
            .bearer_auth(server.token("u1")),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    // The join page only needs the name
    let info = server.client("u1").workspace_info(w2["id"].as_str().unwrap_or_default()).await?;
    assert_eq!(info.name, "Theirs");
    Ok(())
}

#[tokio::test]
async fn reset_invite_code_invalidates_old_code() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let workspace = common::create_workspace(&server, "admin", "Acme").await?;
    let id = workspace["id"].as_str().unwrap_or_default().to_string();
    let old_code = workspace["invite_code"].as_str().unwrap_or_default().to_string();

    let reset = server.client("admin").reset_invite_code(&id).await?;
    assert_ne!(reset.invite_code, old_code);

    let err = server
        .client("joiner")
        .join_workspace(&id, &old_code)
        .await
        .expect_err("old code must be rejected");
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Invalid invite code");

    let joined = server.client("joiner").join_workspace(&id, &reset.invite_code).await?;
    assert_eq!(joined.id, id);

    let again = server.client("joiner").join_workspace(&id, &reset.invite_code).await;
    assert_eq!(again.map_err(|e| e.to_string()).err().as_deref(), Some("Already a member"));
    Ok(())
}

#[tokio::test]
async fn only_admins_update_or_delete_workspaces() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let workspace = common::create_workspace(&server, "admin", "Acme").await?;
    common::join_workspace(&server, "member", &workspace).await?;
    let id = workspace["id"].as_str().unwrap_or_default().to_string();

    let err = server
        .client("member")
        .update_workspace(&id, Some("Renamed"), None)
        .await
        .expect_err("members cannot rename");
    assert_eq!(err.status(), Some(401));

    let updated = server.client("admin").update_workspace(&id, Some("Renamed"), None).await?;
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.invite_code, workspace["invite_code"]);

    assert!(server.client("member").delete_workspace(&id).await.is_err());
    server.client("admin").delete_workspace(&id).await?;
    assert_eq!(server.client("admin").list_workspaces().await?.total, 0);
    Ok(())
}

#[tokio::test]
async fn deleting_workspace_removes_its_documents() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let workspace = common::create_workspace(&server, "admin", "Acme").await?;
    let id = workspace["id"].as_str().unwrap_or_default().to_string();
    let client = server.client("admin");

    client.create_project(&id, "Website", None).await?;
    common::create_task(
        &server,
        "admin",
        json!({ "name": "Ship", "status": "TODO", "workspace_id": id, "due_date": "2026-11-01" }),
    )
    .await?;

    client.delete_workspace(&id).await?;

    for collection in [Collection::Members, Collection::Projects, Collection::Tasks] {
        assert!(server.count(StoreOpKind::Delete, collection) >= 1, "nothing deleted in {}", collection);
    }
    let err = client.get_workspace(&id).await.expect_err("workspace is gone");
    assert_eq!(err.status(), Some(401));
    Ok(())
}
