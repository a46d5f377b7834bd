//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `Admin` role (enforced by handler extractors).
///
/// ```text
/// GET  /login-audits/suspicious          -> suspicious_activity
/// POST /accounts/{id}/revoke-sessions    -> revoke_sessions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/login-audits/suspicious",
            get(admin::suspicious_activity),
        )
        .route(
            "/accounts/{id}/revoke-sessions",
            post(admin::revoke_sessions),
        )
}
