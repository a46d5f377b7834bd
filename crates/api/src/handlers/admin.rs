//! Handlers for the `/admin` resource.
//!
//! All handlers require the `Admin` role via [`RequireAdmin`].

use axum::extract::{Path, Query, State};
use axum::Json;
use backoffice_core::types::DbId;
use backoffice_db::models::login_audit::LoginAudit;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::auth::audit::before_now;
use crate::error::{AppError, AppResult};
use crate::middleware::client::ClientInfo;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default look-back window for the suspicious activity report.
const DEFAULT_SUSPICIOUS_HOURS: i64 = 24;

/// Longest look-back window for the suspicious activity report (one year).
const MAX_SUSPICIOUS_HOURS: i64 = 24 * 365;

/// Query parameters for `GET /admin/login-audits/suspicious`.
#[derive(Debug, Deserialize)]
pub struct SuspiciousQuery {
    pub hours: Option<i64>,
}

/// Request body for `POST /admin/accounts/{id}/revoke-sessions`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RevokeSessionsRequest {
    pub reason: Option<String>,
    pub deactivate: bool,
}

#[derive(Debug, Serialize)]
pub struct RevokeSessionsResponse {
    pub revoked: u64,
}

/// GET /api/v1/admin/login-audits/suspicious?hours=24
pub async fn suspicious_activity(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<SuspiciousQuery>,
) -> AppResult<Json<DataResponse<Vec<LoginAudit>>>> {
    let hours = query.hours.unwrap_or(DEFAULT_SUSPICIOUS_HOURS);
    if !(1..=MAX_SUSPICIOUS_HOURS).contains(&hours) {
        return Err(AppError::BadRequest(format!(
            "hours must be between 1 and {MAX_SUSPICIOUS_HOURS}"
        )));
    }
    let since = before_now(TimeDelta::try_hours(hours), "hours")?;
    let entries = state.login_audit.suspicious_activity(since).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/admin/accounts/{id}/revoke-sessions
pub async fn revoke_sessions(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ClientInfo(client): ClientInfo,
    Path(account_id): Path<DbId>,
    Json(input): Json<RevokeSessionsRequest>,
) -> AppResult<Json<RevokeSessionsResponse>> {
    let revoked = state
        .login
        .revoke_account_sessions(
            account_id,
            &client,
            input.reason.as_deref(),
            input.deactivate,
        )
        .await?;
    tracing::info!(
        admin_id = admin.account_id,
        account_id,
        revoked,
        deactivated = input.deactivate,
        "Admin revoked account sessions"
    );
    Ok(Json(RevokeSessionsResponse { revoked }))
}
