//! Handlers for the `/roles` resource.

use axum::extract::{Path, State};
use axum::Json;
use backoffice_core::types::DbId;
use backoffice_db::models::role::Role;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /roles/{id}/parent`. A null parent makes the role
/// top-level.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetParentRequest {
    pub parent_id: Option<DbId>,
}

type RoleList = Json<DataResponse<Vec<Role>>>;

/// GET /api/v1/roles
pub async fn list(State(state): State<AppState>, _user: AuthUser) -> AppResult<RoleList> {
    Ok(Json(DataResponse {
        data: state.roles.list().await?,
    }))
}

/// GET /api/v1/roles/top-level
pub async fn top_level(State(state): State<AppState>, _user: AuthUser) -> AppResult<RoleList> {
    Ok(Json(DataResponse {
        data: state.roles.top_level().await?,
    }))
}

/// GET /api/v1/roles/{id}
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Role>>> {
    Ok(Json(DataResponse {
        data: state.roles.by_id(id).await?,
    }))
}

/// GET /api/v1/roles/{id}/children
pub async fn children(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<RoleList> {
    Ok(Json(DataResponse {
        data: state.roles.children(id).await?,
    }))
}

/// GET /api/v1/roles/{id}/ancestors
pub async fn ancestors(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<RoleList> {
    Ok(Json(DataResponse {
        data: state.roles.ancestors(id).await?,
    }))
}

/// GET /api/v1/roles/{id}/descendants
pub async fn descendants(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<RoleList> {
    Ok(Json(DataResponse {
        data: state.roles.descendants(id).await?,
    }))
}

/// PUT /api/v1/roles/{id}/parent
///
/// 409 if the move would create a cycle.
pub async fn set_parent(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<SetParentRequest>,
) -> AppResult<Json<DataResponse<Role>>> {
    let role = state.roles.reparent(id, input.parent_id).await?;
    tracing::info!(admin_id = admin.account_id, role_id = id, "Role reparented");
    Ok(Json(DataResponse { data: role }))
}
