//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login     -> login
/// POST /refresh   -> refresh
/// POST /revoke    -> revoke (requires auth)
/// POST /logout    -> logout (requires auth)
/// GET  /validate  -> validate (requires auth)
/// GET  /sessions  -> sessions (requires auth)
/// GET  /history   -> history (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/revoke", post(auth::revoke))
        .route("/logout", post(auth::logout))
        .route("/validate", get(auth::validate))
        .route("/sessions", get(auth::sessions))
        .route("/history", get(auth::history))
}
