//! Organization hierarchy engine.
//!
//! Two halves: assigning the materialized path at creation time, and
//! reconstructing an ownership tree from the flat row set a path-prefix
//! query returns. Reconstruction indexes every row by id as it is read and
//! attaches each row to its parent's children list only when the parent is
//! already indexed and is not the row itself — an arena + index pass, not a
//! recursive traversal.

use std::collections::HashMap;

use gatehouse_core::OrgId;

use crate::model::organization::{Organization, OrganizationNode};

/// Compute a node's materialized path.
///
/// A root node's path is its own id; a child's path is the parent's path
/// with the child id appended. The caller must read `parent_path` inside
/// the same transaction that inserts the node.
pub fn compute_path(id: OrgId, parent_path: Option<&str>) -> String {
    match parent_path {
        Some(parent) if !parent.is_empty() => format!("{parent}.{id}"),
        _ => id.to_string(),
    }
}

/// Rebuild the subtree rooted at `root_id` from rows ordered by path.
///
/// Returns `None` when the root row is absent from the set — callers must
/// treat that as not-found, not as an empty tree. Rows whose parent is not
/// in the set (or not yet indexed) become unattached and are dropped with
/// the arena; rows referencing themselves as parent are never attached to
/// themselves.
pub fn build_tree(root_id: OrgId, rows: Vec<Organization>) -> Option<OrganizationNode> {
    let mut slots: Vec<Option<OrganizationNode>> = Vec::with_capacity(rows.len());
    let mut index: HashMap<OrgId, usize> = HashMap::with_capacity(rows.len());
    // (parent slot, child slot); parent is always the earlier row.
    let mut links: Vec<(usize, usize)> = Vec::new();
    let mut root_slot: Option<usize> = None;

    for organization in rows {
        let id = organization.id;
        let parent_id = organization.parent_id;
        let slot = slots.len();

        // First occurrence wins; a duplicate id would otherwise create two
        // copies of the same subtree.
        if index.contains_key(&id) {
            continue;
        }

        slots.push(Some(OrganizationNode::leaf(organization)));
        index.insert(id, slot);

        if id == root_id {
            root_slot = Some(slot);
        }

        if let Some(parent_id) = parent_id {
            if parent_id != id {
                if let Some(&parent_slot) = index.get(&parent_id) {
                    links.push((parent_slot, slot));
                }
            }
        }
    }

    // Attach deepest-first so every child subtree is complete before it is
    // moved into its parent.
    for &(parent_slot, child_slot) in links.iter().rev() {
        let Some(child) = slots[child_slot].take() else { continue };
        if let Some(parent) = slots[parent_slot].as_mut() {
            parent.children.push(child);
        }
    }

    let mut root = root_slot.and_then(|slot| slots[slot].take())?;
    restore_row_order(&mut root);
    Some(root)
}

/// Reverse-order attachment leaves children reversed; put them back in row
/// (path) order.
fn restore_row_order(node: &mut OrganizationNode) {
    node.children.reverse();
    for child in &mut node.children {
        restore_row_order(child);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use gatehouse_core::{AuditStamps, SoftDelete};

    use super::*;

    fn org(id: OrgId, parent: Option<(OrgId, &str)>) -> Organization {
        let parent_path = parent.map(|(_, p)| p.to_string());
        let path = match &parent_path {
            Some(p) => format!("{p}.{id}"),
            None => id.to_string(),
        };
        Organization {
            id,
            name: format!("org-{id}"),
            code: "org".to_string(),
            address: None,
            latitude: None,
            longitude: None,
            kind: None,
            parent_id: parent.map(|(p, _)| p),
            path: Some(path),
            level: 0,
            is_active: true,
            audit: AuditStamps::new("test", Utc::now()),
            deleted: SoftDelete::default(),
        }
    }

    #[test]
    fn root_path_is_own_id() {
        let id = OrgId::new();
        assert_eq!(compute_path(id, None), id.to_string());
    }

    #[test]
    fn child_path_appends_to_parent_path() {
        let id = OrgId::new();
        assert_eq!(compute_path(id, Some("a.b")), format!("a.b.{id}"));
    }

    #[test]
    fn subtree_contains_descendants_in_row_order() {
        let root = OrgId::new();
        let branch_a = OrgId::new();
        let branch_b = OrgId::new();
        let leaf = OrgId::new();

        let root_row = org(root, None);
        let root_path = root_row.path.clone().unwrap();
        let a_row = org(branch_a, Some((root, root_path.as_str())));
        let a_path = a_row.path.clone().unwrap();
        let rows = vec![
            root_row,
            a_row,
            org(leaf, Some((branch_a, a_path.as_str()))),
            org(branch_b, Some((root, root_path.as_str()))),
        ];

        let tree = build_tree(root, rows).unwrap();
        assert_eq!(tree.organization.id, root);
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].organization.id, branch_a);
        assert_eq!(tree.children[1].organization.id, branch_b);
        assert_eq!(tree.children[0].children[0].organization.id, leaf);
        assert!(tree.contains(leaf));
    }

    #[test]
    fn subtree_of_child_excludes_ancestor() {
        let root = OrgId::new();
        let child = OrgId::new();
        let root_row = org(root, None);
        let root_path = root_row.path.clone().unwrap();
        let child_row = org(child, Some((root, root_path.as_str())));

        // Subtree query for `child` only returns the child row.
        let tree = build_tree(child, vec![child_row]).unwrap();
        assert_eq!(tree.organization.id, child);
        assert!(tree.children.is_empty());
        assert!(!tree.contains(root));
    }

    #[test]
    fn missing_root_is_none_not_empty_tree() {
        let root = OrgId::new();
        assert!(build_tree(root, Vec::new()).is_none());
    }

    #[test]
    fn self_referencing_parent_is_suppressed() {
        let root = OrgId::new();
        let mut row = org(root, None);
        row.parent_id = Some(root);

        let tree = build_tree(root, vec![row]).unwrap();
        assert!(tree.children.is_empty());
    }

    #[test]
    fn duplicate_rows_appear_once() {
        let root = OrgId::new();
        let child = OrgId::new();
        let root_row = org(root, None);
        let root_path = root_row.path.clone().unwrap();
        let child_row = org(child, Some((root, root_path.as_str())));

        let tree = build_tree(root, vec![root_row, child_row.clone(), child_row]).unwrap();
        assert_eq!(tree.children.len(), 1);
    }
}
