//! Handlers for the `/auth` resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use backoffice_core::error::CoreError;
use backoffice_core::login_audit::MAX_LOOKBACK_DAYS;
use backoffice_core::roles::is_admin;
use backoffice_core::types::DbId;
use backoffice_db::models::login_audit::LoginAudit;
use backoffice_db::models::refresh_token::SessionInfo;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::auth::login::LoginPayload;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "not_blank", message = "Username is required"))]
    pub username: String,
    #[validate(custom(function = "not_blank", message = "Password is required"))]
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `POST /auth/revoke`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub refresh_token: String,
    pub reason: Option<String>,
}

/// Query parameters for `GET /auth/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub account_id: DbId,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub active_count: i64,
    pub sessions: Vec<SessionInfo>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Every credential failure is a 401 with the same body.
pub async fn login(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginPayload>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let payload = state
        .login
        .login(&input.username, &input.password, &client)
        .await?;
    Ok(Json(payload))
}

/// POST /api/v1/auth/refresh
///
/// Rotates the presented refresh token. Any problem with the token or its
/// account is a 401.
pub async fn refresh(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<LoginPayload>> {
    let payload = state
        .login
        .refresh(&input.refresh_token, &client)
        .await
        .map_err(|e| {
            if e.as_core().is_some_and(CoreError::is_authentication_failure) {
                AppError::Core(CoreError::Unauthorized(
                    "Invalid or expired refresh token".into(),
                ))
            } else {
                e
            }
        })?;
    Ok(Json(payload))
}

/// POST /api/v1/auth/revoke
///
/// Revoke one of the caller's refresh tokens (admins may revoke any).
/// Returns 204 whether or not it was already revoked.
pub async fn revoke(
    State(state): State<AppState>,
    user: AuthUser,
    ClientInfo(client): ClientInfo,
    Json(input): Json<RevokeRequest>,
) -> AppResult<StatusCode> {
    let owned = state
        .refresh_tokens
        .find(&input.refresh_token)
        .await?
        .is_some_and(|token| token.account_id == user.account_id || is_admin(&user.role));
    if !owned {
        return Err(CoreError::TokenNotFound.into());
    }

    state
        .refresh_tokens
        .revoke(
            &input.refresh_token,
            &client.ip_address,
            input.reason.as_deref(),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/logout
///
/// Revoke every refresh token of the caller. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    ClientInfo(client): ClientInfo,
) -> AppResult<StatusCode> {
    state.login.logout(user.account_id, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/validate
pub async fn validate(user: AuthUser) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        account_id: user.account_id,
        username: user.username,
        role: user.role,
    })
}

/// GET /api/v1/auth/sessions
pub async fn sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<SessionsResponse>>> {
    let active = state
        .refresh_tokens
        .active_for_account(user.account_id)
        .await?;
    Ok(Json(DataResponse {
        data: SessionsResponse {
            active_count: active.len() as i64,
            sessions: active.iter().map(SessionInfo::from).collect(),
        },
    }))
}

/// GET /api/v1/auth/history?days=30
pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<LoginAudit>>>> {
    if query.days.is_some_and(|d| !(1..=MAX_LOOKBACK_DAYS).contains(&d)) {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {MAX_LOOKBACK_DAYS}"
        )));
    }
    let entries = state.login_audit.history(user.account_id, query.days).await?;
    Ok(Json(DataResponse { data: entries }))
}
