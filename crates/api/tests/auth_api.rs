//! HTTP-level integration tests for the `/auth` endpoints.
//!
//! Covers login, refresh-token rotation, revocation, logout, token
//! validation, session listing, and login history.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{
    access_token, body_json, build_test_app, build_test_app_with, get, get_auth, login, post_json,
    post_json_auth, test_config, INACTIVE_USERNAME, PASSWORD, USER_USERNAME,
};
use serde_json::json;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_returns_tokens_and_account_summary() {
    let (app, _store, seed) = build_test_app().await;

    let json = login(app, USER_USERNAME).await;

    assert!(json["accessToken"].is_string());
    assert!(json["refreshToken"].is_string());
    assert!(json["expiresAtUtc"].is_string());
    let summary = &json["accountSummary"];
    assert_eq!(summary["id"], seed.user_id);
    assert_eq!(summary["username"], USER_USERNAME);
    assert_eq!(summary["email"], "operator@test.com");
    assert_eq!(summary["firstName"], "Test");
    assert_eq!(summary["roleName"], "User");
    assert!(summary.get("passwordHash").is_none());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (app, _store, _seed) = build_test_app().await;

    let attempts = [
        json!({ "username": USER_USERNAME, "password": "wrong_password" }),
        json!({ "username": "nobody", "password": PASSWORD }),
        json!({ "username": INACTIVE_USERNAME, "password": PASSWORD }),
    ];

    let mut bodies = Vec::new();
    for body in attempts {
        let response = post_json(app.clone(), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(body_json(response).await);
    }

    assert_eq!(bodies[0]["error"], "Invalid username or password");
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
}

#[tokio::test]
async fn login_with_blank_fields_is_rejected() {
    let (app, _store, _seed) = build_test_app().await;

    let response = post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({ "username": "   ", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "username": USER_USERNAME, "password": "" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_rotates_the_token() {
    let (app, _store, _seed) = build_test_app().await;
    let first = login(app.clone(), USER_USERNAME).await;
    let old_refresh = first["refreshToken"].as_str().unwrap().to_string();

    let response = post_json(
        app.clone(),
        "/api/v1/auth/refresh",
        json!({ "refreshToken": old_refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert!(rotated["accessToken"].is_string());
    assert_ne!(rotated["refreshToken"], first["refreshToken"]);

    // The old token was consumed by the rotation.
    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": old_refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_with_unknown_token_is_unauthorized() {
    let (app, _store, _seed) = build_test_app().await;

    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": "not-a-real-token" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid or expired refresh token");
}

// ---------------------------------------------------------------------------
// Revoke / logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revoke_is_idempotent() {
    let (app, _store, _seed) = build_test_app().await;
    let session = login(app.clone(), USER_USERNAME).await;
    let access = session["accessToken"].as_str().unwrap();
    let body = json!({ "refreshToken": session["refreshToken"], "reason": "Lost device" });

    let response =
        post_json_auth(app.clone(), "/api/v1/auth/revoke", body.clone(), access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json_auth(app.clone(), "/api/v1/auth/revoke", body, access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": session["refreshToken"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoke_unknown_token_is_not_found() {
    let (app, _store, _seed) = build_test_app().await;
    let access = access_token(app.clone(), USER_USERNAME).await;

    let response = post_json_auth(
        app,
        "/api/v1/auth/revoke",
        json!({ "refreshToken": "nope" }),
        &access,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn revoke_of_another_accounts_token_is_not_found_for_non_admins() {
    let (app, _store, _seed) = build_test_app().await;
    let admin_session = login(app.clone(), common::ADMIN_USERNAME).await;
    let user_access = access_token(app.clone(), USER_USERNAME).await;

    let response = post_json_auth(
        app.clone(),
        "/api/v1/auth/revoke",
        json!({ "refreshToken": admin_session["refreshToken"] }),
        &user_access,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The admin's token is untouched.
    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": admin_session["refreshToken"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_every_session() {
    let (app, _store, _seed) = build_test_app().await;
    let first = login(app.clone(), USER_USERNAME).await;
    let second = login(app.clone(), USER_USERNAME).await;
    let access = second["accessToken"].as_str().unwrap();

    let response =
        post_json_auth(app.clone(), "/api/v1/auth/logout", json!({}), access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    for session in [&first, &second] {
        let response = post_json(
            app.clone(),
            "/api/v1/auth/refresh",
            json!({ "refreshToken": session["refreshToken"] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn logout_requires_a_token() {
    let (app, _store, _seed) = build_test_app().await;

    let response = post_json(app, "/api/v1/auth/logout", json!({})).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validate_echoes_the_caller() {
    let (app, _store, seed) = build_test_app().await;
    let access = access_token(app.clone(), USER_USERNAME).await;

    let response = get_auth(app, "/api/v1/auth/validate", &access).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["accountId"], seed.user_id);
    assert_eq!(json["username"], USER_USERNAME);
    assert_eq!(json["role"], "User");
}

#[tokio::test]
async fn validate_accepts_a_header_without_bearer_prefix() {
    let (app, _store, _seed) = build_test_app().await;
    let access = access_token(app.clone(), USER_USERNAME).await;

    let request = Request::builder()
        .uri("/api/v1/auth/validate")
        .header("authorization", access)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn query_token_is_only_accepted_for_streaming_requests() {
    let (app, _store, _seed) = build_test_app().await;
    let access = access_token(app.clone(), USER_USERNAME).await;
    let uri = format!("/api/v1/auth/validate?access_token={access}");

    let response = get(app.clone(), &uri).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri(&uri)
        .header("accept", "text/event-stream")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let (app, _store, _seed) = build_test_app().await;
    let mut access = access_token(app.clone(), USER_USERNAME).await;
    access.push('x');

    let response = get_auth(app, "/api/v1/auth/validate", &access).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Sessions / history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sessions_lists_active_refresh_tokens_without_digests() {
    let (app, _store, _seed) = build_test_app().await;
    login(app.clone(), USER_USERNAME).await;
    let access = access_token(app.clone(), USER_USERNAME).await;

    let response = get_auth(app, "/api/v1/auth/sessions", &access).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["activeCount"], 2);
    let sessions = json["data"]["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["createdByIp"], "10.0.0.1");
    assert!(sessions[0].get("tokenHash").is_none());
}

#[tokio::test]
async fn history_contains_failed_and_successful_attempts() {
    let (app, _store, _seed) = build_test_app().await;
    post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({ "username": USER_USERNAME, "password": "wrong_password" }),
    )
    .await;
    let access = access_token(app.clone(), USER_USERNAME).await;

    let response = get_auth(app, "/api/v1/auth/history?days=7", &access).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let entries = json["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.iter().filter(|e| e["success"] == true).count(), 1);
    let failed = entries.iter().find(|e| e["success"] == false).unwrap();
    assert_eq!(failed["failureReason"], "Invalid password");
    assert_eq!(failed["ipAddress"], "10.0.0.1");
    assert_eq!(failed["userAgent"], "integration-test");
}

#[tokio::test]
async fn history_rejects_non_positive_days() {
    let (app, _store, _seed) = build_test_app().await;
    let access = access_token(app.clone(), USER_USERNAME).await;

    let response = get_auth(app, "/api/v1/auth/history?days=0", &access).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_rejects_oversized_days() {
    let (app, _store, _seed) = build_test_app().await;
    let access = access_token(app.clone(), USER_USERNAME).await;

    for days in ["3651", "10000000000", "9223372036854775807"] {
        let response = get_auth(
            app.clone(),
            &format!("/api/v1/auth/history?days={days}"),
            &access,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "days={days}");
    }
}

#[tokio::test]
async fn forwarded_for_is_ignored_unless_trusted() {
    let mut config = test_config();
    config.trust_forwarded_for = false;
    let (app, _store, _seed) = build_test_app_with(config).await;
    post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({ "username": USER_USERNAME, "password": "wrong_password" }),
    )
    .await;
    let access = access_token(app.clone(), USER_USERNAME).await;

    let response = get_auth(app, "/api/v1/auth/history", &access).await;

    let json = body_json(response).await;
    let entries = json["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["ipAddress"] == "unknown"));
}
