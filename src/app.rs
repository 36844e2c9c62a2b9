use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::session_middleware;
use crate::state::AppState;

/// Full application router over `state`
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    let app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/files/:bucket/:id", get(public::files::get))
        // Protected API
        .merge(api_routes(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn api_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, members, projects, tasks, workspaces};

    Router::new()
        .route("/api/auth/current", get(auth::current))
        .route("/api/workspaces", get(workspaces::list).post(workspaces::create))
        .route(
            "/api/workspaces/:id",
            get(workspaces::get).patch(workspaces::update).delete(workspaces::delete),
        )
        .route("/api/workspaces/:id/info", get(workspaces::info))
        .route("/api/workspaces/:id/reset-invite-code", post(workspaces::reset_invite_code))
        .route("/api/workspaces/:id/join", post(workspaces::join))
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/:id",
            get(projects::get).patch(projects::update).delete(projects::delete),
        )
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route("/api/tasks/bulk-update", post(tasks::bulk_update))
        .route(
            "/api/tasks/:id",
            get(tasks::get).patch(tasks::update).delete(tasks::delete),
        )
        .route("/api/members", get(members::list))
        .route("/api/members/:id", axum::routing::delete(members::delete).patch(members::update))
        .route_layer(middleware::from_fn_with_state(state, session_middleware))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn root() -> Json<Value> {
    Json(json!({
        "data": {
            "name": "Planboard API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Workspaces, projects and tasks behind membership-gated routes",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "files": "/files/:bucket/:id (public)",
                "auth": "/api/auth/current (protected)",
                "workspaces": "/api/workspaces[/:id[/info|/join|/reset-invite-code]] (protected)",
                "projects": "/api/projects[/:id] (protected)",
                "tasks": "/api/tasks[/:id|/bulk-update] (protected)",
                "members": "/api/members[/:id] (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "store unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{generate_jwt, Claims};
    use crate::config::AppConfig;
    use crate::storage::MemoryFileStorage;
    use crate::store::MemoryDocumentStore;

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryFileStorage::new()),
            AppConfig::development(),
        )
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let (status, body) = call(router(state()), Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Planboard API");
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_and_forged_tokens() {
        let app = router(state());

        let (status, _) = call(app.clone(), Request::get("/api/workspaces").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let forged = generate_jwt(&Claims::new("u1", "Ada", "ada@example.com", 1), "some-other-secret").unwrap();
        let request = Request::get("/api/auth/current")
            .header("authorization", format!("Bearer {}", forged))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn static_bulk_route_wins_over_task_id() {
        let state = state();
        let token = generate_jwt(
            &Claims::new("u1", "Ada", "ada@example.com", 1),
            &state.config.security.jwt_secret,
        )
        .unwrap();
        let request = Request::post("/api/tasks/bulk-update")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"tasks":[]}"#))
            .unwrap();

        let (status, body) = call(router(state), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field_errors"]["tasks"], "Required");
    }

    #[test]
    fn cors_follows_configuration() {
        let mut security = AppConfig::development().security;
        security.enable_cors = false;
        assert!(cors_layer(&security).is_none());

        security.enable_cors = true;
        security.cors_origins = vec!["https://plan.example".into()];
        assert!(cors_layer(&security).is_some());
    }
}
