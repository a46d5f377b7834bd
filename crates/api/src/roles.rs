//! Role hierarchy reads and parent reassignment.
//!
//! Every read works on a fresh [`RoleTree`] snapshot of the whole role
//! table; role tables are small and the walks are iterative.

use std::sync::Arc;

use backoffice_core::error::CoreError;
use backoffice_core::role_tree::RoleTree;
use backoffice_core::types::DbId;
use backoffice_db::models::role::Role;
use backoffice_db::store::RoleRepository;
use tokio::sync::Mutex;

use crate::error::AppResult;

pub struct RoleHierarchy {
    roles: Arc<dyn RoleRepository>,
    /// Serializes check-then-update in [`RoleHierarchy::reparent`] so two
    /// concurrent moves cannot jointly close a cycle.
    reparent_lock: Mutex<()>,
}

impl RoleHierarchy {
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self {
            roles,
            reparent_lock: Mutex::new(()),
        }
    }

    async fn tree(&self) -> AppResult<RoleTree<Role>> {
        Ok(RoleTree::new(self.roles.list_roles().await?))
    }

    /// Load a tree and confirm `id` exists in it.
    async fn tree_containing(&self, id: DbId) -> AppResult<RoleTree<Role>> {
        let tree = self.tree().await?;
        if tree.get(id).is_none() {
            return Err(not_found(id));
        }
        Ok(tree)
    }

    pub async fn list(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.list_roles().await?)
    }

    pub async fn by_id(&self, id: DbId) -> AppResult<Role> {
        self.roles
            .find_role(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Name of the role with `id`, for claim enrichment.
    pub async fn resolve_name(&self, id: DbId) -> AppResult<String> {
        Ok(self.by_id(id).await?.name)
    }

    /// Direct children of `id`, ordered by id.
    pub async fn children(&self, id: DbId) -> AppResult<Vec<Role>> {
        let tree = self.tree_containing(id).await?;
        Ok(tree.children(id).into_iter().cloned().collect())
    }

    /// Roles without a parent, ordered by id.
    pub async fn top_level(&self) -> AppResult<Vec<Role>> {
        let tree = self.tree().await?;
        Ok(tree.top_level().into_iter().cloned().collect())
    }

    /// Ancestors of `id`, root first, ending at the direct parent.
    pub async fn ancestors(&self, id: DbId) -> AppResult<Vec<Role>> {
        let tree = self.tree_containing(id).await?;
        Ok(tree.ancestors(id).into_iter().cloned().collect())
    }

    /// Every role below `id`, breadth-first.
    pub async fn descendants(&self, id: DbId) -> AppResult<Vec<Role>> {
        let tree = self.tree_containing(id).await?;
        Ok(tree.descendants(id).into_iter().cloned().collect())
    }

    /// Move `role_id` under `new_parent_id`, or to the top level with `None`.
    ///
    /// Fails with `CyclicRoleAssignment` if the new parent is the role itself
    /// or one of its descendants; nothing is written in that case.
    pub async fn reparent(&self, role_id: DbId, new_parent_id: Option<DbId>) -> AppResult<Role> {
        let _guard = self.reparent_lock.lock().await;

        let tree = self.tree().await?;
        if let Err(e) = tree.check_reparent(role_id, new_parent_id) {
            if let CoreError::CyclicRoleAssignment { role_id, parent_id } = &e {
                tracing::warn!(role_id, parent_id, "Rejected cyclic role assignment");
            }
            return Err(e.into());
        }

        let role = self
            .roles
            .set_role_parent(role_id, new_parent_id)
            .await?
            .ok_or_else(|| not_found(role_id))?;
        tracing::info!(role_id, parent_id = ?new_parent_id, "Role parent changed");
        Ok(role)
    }
}

fn not_found(id: DbId) -> crate::error::AppError {
    CoreError::NotFound { entity: "role", id }.into()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use backoffice_db::memory::MemoryStore;
    use backoffice_db::models::role::CreateRole;

    use super::*;
    use crate::error::AppError;

    /// ```text
    /// Admin
    /// ├── Manager
    /// │   └── Clerk
    /// └── Auditor
    /// Guest
    /// ```
    async fn seeded() -> (RoleHierarchy, Vec<Role>) {
        let store = Arc::new(MemoryStore::new());
        let mut roles: Vec<Role> = Vec::new();
        for (name, parent) in [
            ("Admin", None),
            ("Manager", Some(0)),
            ("Clerk", Some(1)),
            ("Auditor", Some(0)),
            ("Guest", None),
        ] {
            let parent_role_id = parent.map(|i: usize| roles[i].id);
            let role: Role = store
                .create_role(&CreateRole {
                    name: name.into(),
                    description: None,
                    parent_role_id,
                })
                .await
                .unwrap();
            roles.push(role);
        }
        (RoleHierarchy::new(store), roles)
    }

    fn names(roles: &[Role]) -> Vec<&str> {
        roles.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn reads_follow_the_tree() {
        let (hierarchy, roles) = seeded().await;
        let (admin, clerk) = (roles[0].id, roles[2].id);

        assert_eq!(names(&hierarchy.children(admin).await.unwrap()), ["Manager", "Auditor"]);
        assert_eq!(names(&hierarchy.top_level().await.unwrap()), ["Admin", "Guest"]);
        assert_eq!(names(&hierarchy.ancestors(clerk).await.unwrap()), ["Admin", "Manager"]);
        assert_eq!(
            names(&hierarchy.descendants(admin).await.unwrap()),
            ["Manager", "Auditor", "Clerk"]
        );
        assert_eq!(hierarchy.resolve_name(clerk).await.unwrap(), "Clerk");
    }

    #[tokio::test]
    async fn unknown_role_is_not_found() {
        let (hierarchy, _) = seeded().await;
        assert_matches!(
            hierarchy.by_id(999).await,
            Err(AppError::Core(CoreError::NotFound { id: 999, .. }))
        );
        assert_matches!(
            hierarchy.resolve_name(999).await,
            Err(AppError::Core(CoreError::NotFound { id: 999, .. }))
        );
        assert_matches!(
            hierarchy.ancestors(999).await,
            Err(AppError::Core(CoreError::NotFound { .. }))
        );
    }

    #[tokio::test]
    async fn reparent_under_descendant_is_rejected() {
        let (hierarchy, roles) = seeded().await;
        let (admin, clerk) = (roles[0].id, roles[2].id);

        assert_matches!(
            hierarchy.reparent(admin, Some(clerk)).await,
            Err(AppError::Core(CoreError::CyclicRoleAssignment { .. }))
        );
        assert_eq!(hierarchy.by_id(admin).await.unwrap().parent_role_id, None);
    }

    #[tokio::test]
    async fn reparent_elsewhere_succeeds() {
        let (hierarchy, roles) = seeded().await;
        let (clerk, auditor, guest) = (roles[2].id, roles[3].id, roles[4].id);

        let moved = hierarchy.reparent(clerk, Some(auditor)).await.unwrap();
        assert_eq!(moved.parent_role_id, Some(auditor));
        assert_eq!(
            names(&hierarchy.ancestors(clerk).await.unwrap()),
            ["Admin", "Auditor"]
        );

        let root = hierarchy.reparent(guest, None).await.unwrap();
        assert_eq!(root.parent_role_id, None);
    }

    #[tokio::test]
    async fn reparent_to_missing_parent_is_not_found() {
        let (hierarchy, roles) = seeded().await;
        assert_matches!(
            hierarchy.reparent(roles[1].id, Some(999)).await,
            Err(AppError::Core(CoreError::NotFound { id: 999, .. }))
        );
    }
}
