//! Id-indexed role hierarchy with iterative walks.
//!
//! The role table is user-editable, so the parent relation may be deep or,
//! if the data was corrupted outside this service, even cyclic. Every walk
//! here is a loop over an explicit frontier with a visited set, so it visits
//! each role at most once and never recurses.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::CoreError;
use crate::types::DbId;

/// A row that participates in the role hierarchy.
pub trait HierarchyNode {
    fn node_id(&self) -> DbId;
    fn parent_node_id(&self) -> Option<DbId>;
}

/// Snapshot of the role table indexed by id and by parent.
#[derive(Debug, Clone)]
pub struct RoleTree<T> {
    nodes: HashMap<DbId, T>,
    children: HashMap<DbId, Vec<DbId>>,
}

impl<T: HierarchyNode> RoleTree<T> {
    pub fn new(rows: impl IntoIterator<Item = T>) -> Self {
        let mut nodes = HashMap::new();
        let mut children: HashMap<DbId, Vec<DbId>> = HashMap::new();
        for row in rows {
            if let Some(parent) = row.parent_node_id() {
                children.entry(parent).or_default().push(row.node_id());
            }
            nodes.insert(row.node_id(), row);
        }
        for ids in children.values_mut() {
            ids.sort_unstable();
        }
        Self { nodes, children }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: DbId) -> Option<&T> {
        self.nodes.get(&id)
    }

    /// Direct children of `id`, ordered by id.
    pub fn children(&self, id: DbId) -> Vec<&T> {
        self.children
            .get(&id)
            .map(|ids| ids.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    /// Roles without a parent, ordered by id.
    pub fn top_level(&self) -> Vec<&T> {
        let mut roots: Vec<&T> = self
            .nodes
            .values()
            .filter(|n| n.parent_node_id().is_none())
            .collect();
        roots.sort_unstable_by_key(|n| n.node_id());
        roots
    }

    /// Ancestors of `id` ordered from the root down to the direct parent.
    /// `id` itself is never included.
    pub fn ancestors(&self, id: DbId) -> Vec<&T> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut cursor = self.nodes.get(&id).and_then(|n| n.parent_node_id());

        while let Some(parent_id) = cursor {
            if !visited.insert(parent_id) {
                tracing::warn!(role_id = id, parent_id, "Role hierarchy contains a cycle");
                break;
            }
            let Some(parent) = self.nodes.get(&parent_id) else {
                break;
            };
            chain.push(parent);
            cursor = parent.parent_node_id();
        }

        chain.reverse();
        chain
    }

    /// All descendants of `id`, breadth-first, siblings ordered by id.
    pub fn descendants(&self, id: DbId) -> Vec<&T> {
        let mut result = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut frontier = VecDeque::from([id]);

        while let Some(current) = frontier.pop_front() {
            let Some(child_ids) = self.children.get(&current) else {
                continue;
            };
            for &child_id in child_ids {
                if !visited.insert(child_id) {
                    tracing::warn!(role_id = id, child_id, "Role hierarchy contains a cycle");
                    continue;
                }
                if let Some(child) = self.nodes.get(&child_id) {
                    result.push(child);
                    frontier.push_back(child_id);
                }
            }
        }

        result
    }

    /// Check that `role_id` may be moved under `new_parent_id`.
    ///
    /// Fails with `NotFound` if either role is missing and with
    /// `CyclicRoleAssignment` if the new parent is the role itself or one of
    /// its descendants (equivalently: `role_id` is an ancestor of the new
    /// parent).
    pub fn check_reparent(&self, role_id: DbId, new_parent_id: Option<DbId>) -> Result<(), CoreError> {
        if !self.nodes.contains_key(&role_id) {
            return Err(CoreError::NotFound {
                entity: "role",
                id: role_id,
            });
        }
        let Some(parent_id) = new_parent_id else {
            return Ok(());
        };
        if !self.nodes.contains_key(&parent_id) {
            return Err(CoreError::NotFound {
                entity: "role",
                id: parent_id,
            });
        }
        let cyclic = parent_id == role_id
            || self
                .ancestors(parent_id)
                .iter()
                .any(|a| a.node_id() == role_id);
        if cyclic {
            return Err(CoreError::CyclicRoleAssignment { role_id, parent_id });
        }
        Ok(())
    }
}
