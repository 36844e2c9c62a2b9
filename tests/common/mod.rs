#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use planboard_api::auth::{generate_jwt, Claims};
use planboard_api::client::ApiClient;
use planboard_api::config::AppConfig;
use planboard_api::storage::memory::MemoryFileStorage;
use planboard_api::store::memory::StoreOpKind;
use planboard_api::store::{Collection, MemoryDocumentStore};
use planboard_api::{router, AppState};

/// In-process server over in-memory backends, one per test
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryDocumentStore>,
    pub storage: Arc<MemoryFileStorage>,
    secret: String,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        let store = Arc::new(MemoryDocumentStore::new().with_max_limit(config.filter.max_limit));
        let storage = Arc::new(MemoryFileStorage::new());
        config.api.port = port;
        config.api.public_url = base_url.clone();
        let secret = config.security.jwt_secret.clone();

        let state = AppState::new(store.clone(), storage.clone(), config);
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });

        Ok(Self { base_url, store, storage, secret })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Session token for a user, signed with the server's secret
    pub fn token(&self, user_id: &str) -> String {
        let claims = Claims::new(user_id, &format!("User {}", user_id), &format!("{}@example.com", user_id), 1);
        generate_jwt(&claims, &self.secret).expect("failed to sign test token")
    }

    pub fn client(&self, user_id: &str) -> ApiClient {
        ApiClient::new(&self.base_url).with_token(self.token(user_id))
    }

    pub fn count(&self, kind: StoreOpKind, collection: Collection) -> usize {
        self.store.count_operations(kind, collection)
    }
}

/// Sends a request and returns the status plus the JSON body
pub async fn send(request: reqwest::RequestBuilder) -> Result<(StatusCode, Value)> {
    let res = request.send().await?;
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

pub async fn create_workspace(server: &TestServer, user_id: &str, name: &str) -> Result<Value> {
    let form = reqwest::multipart::Form::new().text("name", name.to_string());
    let (status, body) = send(
        reqwest::Client::new()
            .post(server.url("/api/workspaces"))
            .bearer_auth(server.token(user_id))
            .multipart(form),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "workspace create failed: {} {}", status, body);
    Ok(body["data"].clone())
}

pub async fn join_workspace(server: &TestServer, user_id: &str, workspace: &Value) -> Result<()> {
    let id = workspace["id"].as_str().unwrap_or_default();
    let (status, body) = send(
        reqwest::Client::new()
            .post(server.url(&format!("/api/workspaces/{}/join", id)))
            .bearer_auth(server.token(user_id))
            .json(&json!({ "code": workspace["invite_code"] })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "join failed: {} {}", status, body);
    Ok(())
}

pub async fn create_task(server: &TestServer, user_id: &str, body: Value) -> Result<Value> {
    let (status, body) = send(
        reqwest::Client::new()
            .post(server.url("/api/tasks"))
            .bearer_auth(server.token(user_id))
            .json(&body),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "task create failed: {} {}", status, body);
    Ok(body["data"].clone())
}
