//! Liveness endpoint mounted at the root, outside `/api/v1`.
//!
//! The process answers 200 whenever it can serve at all. A store that does
//! not answer its ping turns the status to `degraded` so load balancers and
//! operators can tell a live process from a usable one.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

impl HealthStatus {
    fn from_store(reachable: bool) -> Self {
        if reachable {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Package version of the running binary.
    pub version: &'static str,
    /// Result of the store ping.
    pub db_healthy: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = state
        .store_health
        .ping()
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Store ping failed"))
        .is_ok();

    Json(HealthResponse {
        status: HealthStatus::from_store(db_healthy),
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
