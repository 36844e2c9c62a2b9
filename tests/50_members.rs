mod common;

use anyhow::Result;
use planboard_api::models::MemberRole;

#[tokio::test]
async fn only_member_cannot_leave_or_be_downgraded() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let workspace = common::create_workspace(&server, "admin", "Acme").await?;
    let ws = workspace["id"].as_str().unwrap_or_default();
    let client = server.client("admin");
    let me = client.list_members(ws).await?.documents.remove(0);

    let err = client.delete_member(&me.id).await.expect_err("sole member");
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Cannot delete the only member");

    let err = client.update_member(&me.id, MemberRole::Member).await.expect_err("sole member");
    assert_eq!(err.to_string(), "Cannot downgrade the only member");
    Ok(())
}

#[tokio::test]
async fn admins_manage_roles_and_members_may_leave() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let workspace = common::create_workspace(&server, "admin", "Acme").await?;
    common::join_workspace(&server, "bob", &workspace).await?;
    common::join_workspace(&server, "carol", &workspace).await?;
    let ws = workspace["id"].as_str().unwrap_or_default();

    let members = server.client("admin").list_members(ws).await?;
    assert_eq!(members.total, 3);
    let find = |user: &str| {
        members
            .documents
            .iter()
            .find(|m| m.user_id == user)
            .map(|m| m.id.clone())
            .unwrap_or_default()
    };
    let (bob, carol) = (find("bob"), find("carol"));

    // Plain members cannot promote or remove others
    let err = server.client("bob").update_member(&carol, MemberRole::Admin).await.expect_err("not admin");
    assert_eq!(err.status(), Some(401));
    assert!(server.client("bob").delete_member(&carol).await.is_err());

    let promoted = server.client("admin").update_member(&bob, MemberRole::Admin).await?;
    assert!(promoted.is_admin());

    server.client("carol").delete_member(&carol).await?;
    assert_eq!(server.client("admin").list_members(ws).await?.total, 2);
    Ok(())
}

#[tokio::test]
async fn last_admin_must_hand_over_before_leaving() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let workspace = common::create_workspace(&server, "admin", "Acme").await?;
    common::join_workspace(&server, "bob", &workspace).await?;
    let ws = workspace["id"].as_str().unwrap_or_default();
    let client = server.client("admin");

    let members = client.list_members(ws).await?;
    let id_of = |user: &str| {
        members
            .documents
            .iter()
            .find(|m| m.user_id == user)
            .map(|m| m.id.clone())
            .unwrap_or_default()
    };
    let (admin, bob) = (id_of("admin"), id_of("bob"));

    let err = client.delete_member(&admin).await.expect_err("last admin");
    assert_eq!(err.to_string(), "Cannot delete the last admin");
    let err = client.update_member(&admin, MemberRole::Member).await.expect_err("last admin");
    assert_eq!(err.to_string(), "Cannot downgrade the last admin");

    client.update_member(&bob, MemberRole::Admin).await?;
    client.delete_member(&admin).await?;

    let remaining = server.client("bob").list_members(ws).await?;
    assert_eq!(remaining.total, 1);
    assert!(remaining.documents[0].is_admin());
    Ok(())
}
