//! Shared fixtures for the HTTP integration tests.
//!
//! Every test gets its own [`MemoryStore`] seeded with a small role tree and
//! two accounts, wired through the same router builder as `main.rs`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use backoffice_api::auth::password::hash_password;
use backoffice_api::config::{AuthConfig, RetentionConfig, ServerConfig};
use backoffice_api::router::build_app_router;
use backoffice_api::state::AppState;
use backoffice_db::memory::MemoryStore;
use backoffice_db::models::account::CreateAccount;
use backoffice_db::models::role::CreateRole;
use backoffice_db::store::{AccountRepository, RoleRepository};

pub const ADMIN_USERNAME: &str = "admin";
pub const USER_USERNAME: &str = "operator";
pub const INACTIVE_USERNAME: &str = "former";
pub const PASSWORD: &str = "test_password_123!";

/// Ids of the seeded rows.
///
/// ```text
/// Admin (admin)
/// └── Supervisor
///     └── User (operator, former)
/// Auditor
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub admin_role: i64,
    pub supervisor_role: i64,
    pub user_role: i64,
    pub auditor_role: i64,
    pub admin_id: i64,
    pub user_id: i64,
    pub inactive_id: i64,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        trust_forwarded_for: true,
        auth: AuthConfig {
            jwt_secret: "integration-test-signing-key".to_string(),
            issuer: "backoffice-test".to_string(),
            audience: "backoffice-clients".to_string(),
            access_token_expiry_hours: 2,
            refresh_token_expiry_days: 7,
            refresh_digest_key: "integration-test-digest-key".to_string(),
        },
        retention: RetentionConfig {
            audit_retention_days: 90,
            cleanup_interval_secs: 3600,
        },
    }
}

async fn seed(store: &MemoryStore) -> Seed {
    let role = |name: &str, parent: Option<i64>| CreateRole {
        name: name.to_string(),
        description: None,
        parent_role_id: parent,
    };
    let admin_role = store.create_role(&role("Admin", None)).await.unwrap().id;
    let supervisor_role = store
        .create_role(&role("Supervisor", Some(admin_role)))
        .await
        .unwrap()
        .id;
    let user_role = store
        .create_role(&role("User", Some(supervisor_role)))
        .await
        .unwrap()
        .id;
    let auditor_role = store.create_role(&role("Auditor", None)).await.unwrap().id;

    let password_hash = hash_password(PASSWORD).expect("hashing should succeed");
    let account = |username: &str, role_id: i64| CreateAccount {
        username: username.to_string(),
        email: Some(format!("{username}@test.com")),
        password_hash: password_hash.clone(),
        first_name: Some("Test".to_string()),
        last_name: Some(username.to_string()),
        role_id,
    };
    let admin_id = store
        .create_account(&account(ADMIN_USERNAME, admin_role))
        .await
        .unwrap()
        .id;
    let user_id = store
        .create_account(&account(USER_USERNAME, user_role))
        .await
        .unwrap()
        .id;
    let inactive_id = store
        .create_account(&account(INACTIVE_USERNAME, user_role))
        .await
        .unwrap()
        .id;
    store.set_account_active(inactive_id, false).await.unwrap();

    Seed {
        admin_role,
        supervisor_role,
        user_role,
        auditor_role,
        admin_id,
        user_id,
        inactive_id,
    }
}

/// Build the full application router over a freshly seeded in-memory store.
///
/// The test config trusts `X-Forwarded-For`, so requests built here are
/// attributed to `10.0.0.1`.
pub async fn build_test_app() -> (Router, Arc<MemoryStore>, Seed) {
    build_test_app_with(test_config()).await
}

/// Same as [`build_test_app`] with a caller-supplied config.
pub async fn build_test_app_with(config: ServerConfig) -> (Router, Arc<MemoryStore>, Seed) {
    let store = Arc::new(MemoryStore::new());
    let seed = seed(&store).await;
    let state = AppState::new(config.clone(), Arc::clone(&store));
    let app = build_app_router(state, &config).expect("test config is valid");
    (app, store, seed)
}

fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "10.0.0.1")
        .header("user-agent", "integration-test");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Send a GET request without authentication.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with a bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body and no authentication.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(json_request(Method::POST, uri, None, &body))
        .await
        .unwrap()
}

/// Send a POST request with a JSON body and a bearer token.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    app.oneshot(json_request(Method::POST, uri, Some(token), &body))
        .await
        .unwrap()
}

/// Send a PUT request with a JSON body and a bearer token.
pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    app.oneshot(json_request(Method::PUT, uri, Some(token), &body))
        .await
        .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in through the API and return the login payload.
pub async fn login(app: Router, username: &str) -> serde_json::Value {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "username": username, "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await
}

/// Log in and return only the access token.
pub async fn access_token(app: Router, username: &str) -> String {
    login(app, username).await["accessToken"]
        .as_str()
        .expect("accessToken is a string")
        .to_string()
}
