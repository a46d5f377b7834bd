//! Route definitions for the `/roles` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::roles;
use crate::state::AppState;

/// Routes mounted at `/roles`.
///
/// ```text
/// GET /                   -> list
/// GET /top-level          -> top_level
/// GET /{id}               -> get
/// GET /{id}/children      -> children
/// GET /{id}/ancestors     -> ancestors
/// GET /{id}/descendants   -> descendants
/// PUT /{id}/parent        -> set_parent (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(roles::list))
        .route("/top-level", get(roles::top_level))
        .route("/{id}", get(roles::get))
        .route("/{id}/children", get(roles::children))
        .route("/{id}/ancestors", get(roles::ancestors))
        .route("/{id}/descendants", get(roles::descendants))
        .route("/{id}/parent", put(roles::set_parent))
}
