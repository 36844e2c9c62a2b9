use std::future::Future;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::AuthUser;
use crate::models::Member;
use crate::store::{from_document, Collection, DocumentStore, StoreError};

/// Membership of `user_id` in `workspace_id`, if any. The first match wins.
pub async fn find_membership(
    store: &dyn DocumentStore,
    user_id: &str,
    workspace_id: &str,
) -> Result<Option<Member>, StoreError> {
    let members = store
        .list_documents(
            Collection::Members,
            FilterData::new()
                .equal("user_id", user_id)
                .equal("workspace_id", workspace_id),
        )
        .await?;

    members.documents.into_iter().next().map(from_document).transpose()
}

/// Guards every workspace-scoped operation behind a membership lookup.
///
/// The lookup always completes before the decision is made, so a denied
/// caller never reaches the guarded store operation.
pub struct MembershipGate<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> MembershipGate<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// The caller's membership, or `Unauthorized`
    pub async fn authorize(&self, user: &AuthUser, workspace_id: &str) -> Result<Member, ApiError> {
        match find_membership(self.store, &user.id, workspace_id).await? {
            Some(member) => {
                debug!("User {} authorized for workspace {}", user.id, workspace_id);
                Ok(member)
            }
            None => {
                warn!("User {} is not a member of workspace {}", user.id, workspace_id);
                Err(ApiError::unauthorized("Unauthorized"))
            }
        }
    }

    /// Like `authorize` but also requires the ADMIN role
    pub async fn authorize_admin(&self, user: &AuthUser, workspace_id: &str) -> Result<Member, ApiError> {
        let member = self.authorize(user, workspace_id).await?;
        if !member.is_admin() {
            warn!("User {} is not an admin of workspace {}", user.id, workspace_id);
            return Err(ApiError::unauthorized("Unauthorized"));
        }
        Ok(member)
    }

    /// Runs `op` with the caller's membership, or fails without calling it
    pub async fn run<T, F, Fut>(&self, user: &AuthUser, workspace_id: &str, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(Member) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let member = self.authorize(user, workspace_id).await?;
        op(member).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn user(id: &str) -> AuthUser {
        AuthUser { id: id.into(), name: "Ada".into(), email: "ada@example.com".into() }
    }

    async fn add_member(store: &MemoryDocumentStore, user_id: &str, workspace_id: &str, role: &str) {
        let doc = json!({ "user_id": user_id, "workspace_id": workspace_id, "role": role, "name": "", "email": "" });
        store
            .create_document(Collection::Members, doc.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn finds_membership_only_when_record_exists() {
        let store = MemoryDocumentStore::new();
        add_member(&store, "u1", "w1", "MEMBER").await;

        let found = find_membership(&store, "u1", "w1").await.unwrap();
        assert_eq!(found.map(|m| m.workspace_id), Some("w1".to_string()));
        assert!(find_membership(&store, "u1", "w2").await.unwrap().is_none());
        assert!(find_membership(&store, "u2", "w1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn absent_membership_is_unauthorized_and_skips_op() {
        let store = MemoryDocumentStore::new();
        let called = AtomicBool::new(false);

        let result = MembershipGate::new(&store)
            .run(&user("u1"), "w1", |_| async {
                called.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(result.unwrap_err(), ApiError::unauthorized("Unauthorized"));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn admin_gate_requires_admin_role() {
        let store = MemoryDocumentStore::new();
        add_member(&store, "u1", "w1", "MEMBER").await;
        add_member(&store, "u2", "w1", "ADMIN").await;

        let gate = MembershipGate::new(&store);
        assert!(gate.authorize_admin(&user("u1"), "w1").await.unwrap_err().is_unauthorized());
        assert!(gate.authorize_admin(&user("u2"), "w1").await.unwrap().is_admin());
    }

    #[tokio::test]
    async fn store_failure_is_not_reported_as_unauthorized() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(true);
        let err = MembershipGate::new(&store).authorize(&user("u1"), "w1").await.unwrap_err();
        assert_eq!(err.status_code(), 503);
    }
}
