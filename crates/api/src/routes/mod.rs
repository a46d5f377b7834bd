pub mod admin;
pub mod auth;
pub mod health;
pub mod roles;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/refresh                                    rotate refresh token (public)
/// /auth/revoke                                     revoke one refresh token
/// /auth/logout                                     revoke all own refresh tokens
/// /auth/validate                                   echo caller identity
/// /auth/sessions                                   own active sessions
/// /auth/history                                    own login history
///
/// /admin/login-audits/suspicious                   brute-force report (admin only)
/// /admin/accounts/{id}/revoke-sessions             force logout (admin only)
///
/// /roles                                           list
/// /roles/top-level                                 roles without a parent
/// /roles/{id}                                      get
/// /roles/{id}/children                             direct children
/// /roles/{id}/ancestors                            root-first ancestor chain
/// /roles/{id}/descendants                          breadth-first subtree
/// /roles/{id}/parent                               reparent (PUT, admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication and session management.
        .nest("/auth", auth::router())
        // Audit reports and forced session revocation.
        .nest("/admin", admin::router())
        // Role hierarchy reads and reparenting.
        .nest("/roles", roles::router())
}
