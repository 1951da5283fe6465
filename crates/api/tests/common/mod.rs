#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use slotswap_core::store::{MemoryStore, SlotStore};
use slotswap_core::swap::SwapPolicy;
use tower::ServiceExt;

use slotswap_api::auth::jwt::JwtConfig;
use slotswap_api::config::ServerConfig;
use slotswap_api::router::build_app_router;
use slotswap_api::state::AppState;
use slotswap_api::ws::WsManager;
use slotswap_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            expiry_hours: 1,
        },
        swap_policy: SwapPolicy::Strict,
        reconcile_interval_secs: 300,
        database_url: None,
    }
}

/// A router plus the state behind it, so tests can inspect the store or
/// subscribe to the event bus.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// A fresh router sharing this app's state.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router, with the production middleware stack,
/// over an empty in-memory store.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store: Arc<dyn SlotStore> = Arc::new(MemoryStore::new());
    let state = AppState::new(
        store,
        Arc::new(config.clone()),
        Arc::new(WsManager::new()),
        Arc::new(EventBus::default()),
    );
    let router = build_app_router(state.clone(), &config);
    TestApp { router, state }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Domain helpers
// ---------------------------------------------------------------------------

/// A signed-up user: id plus bearer token.
pub struct TestUser {
    pub id: i64,
    pub token: String,
}

/// Sign up `name` with email `<name>@example.com` via the API.
pub async fn signup(app: &TestApp, name: &str) -> TestUser {
    let body = serde_json::json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "password": "secret-password",
    });
    let response = post_json(app.app(), "/api/v1/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    TestUser {
        id: json["data"]["user"]["id"].as_i64().unwrap(),
        token: json["data"]["access_token"].as_str().unwrap().to_string(),
    }
}

/// Create a slot for `user` via the API and return its id.
pub async fn create_slot(app: &TestApp, user: &TestUser, title: &str, day: u32, status: &str) -> i64 {
    let body = serde_json::json!({
        "title": title,
        "start_time": format!("2026-03-{day:02}T09:00:00Z"),
        "end_time": format!("2026-03-{day:02}T10:00:00Z"),
        "status": status,
    });
    let response = post_json_auth(app.app(), "/api/v1/slots", body, &user.token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
