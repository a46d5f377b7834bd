//! Role entity model.

use backoffice_core::role_tree::HierarchyNode;
use backoffice_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A role row from the `roles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub parent_role_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl HierarchyNode for Role {
    fn node_id(&self) -> DbId {
        self.id
    }

    fn parent_node_id(&self) -> Option<DbId> {
        self.parent_role_id
    }
}

/// DTO for creating a role.
#[derive(Debug, Clone)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
    pub parent_role_id: Option<DbId>,
}
