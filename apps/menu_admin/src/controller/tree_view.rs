//! Flat render model of the menu tree.

use std::collections::HashSet;

use shared::domain::{MenuId, MenuTreeNode};

pub const ROOT_LABEL: &str = "メニュー";

/// One visible line of the tree. The synthetic root has no record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub record_id: Option<MenuId>,
    pub name: String,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub selected: bool,
}

/// Walks the tree depth first with an explicit stack, descending only into
/// expanded nodes. The synthetic root is always expanded.
pub fn flatten_tree(
    tree: &[MenuTreeNode],
    expanded: &[MenuId],
    selected: Option<&MenuId>,
) -> Vec<TreeRow> {
    let expanded: HashSet<&MenuId> = expanded.iter().collect();
    let mut rows = vec![TreeRow {
        record_id: None,
        name: ROOT_LABEL.to_string(),
        depth: 0,
        has_children: !tree.is_empty(),
        expanded: true,
        selected: selected.is_none(),
    }];

    let mut stack: Vec<(&MenuTreeNode, usize)> = tree.iter().rev().map(|node| (node, 1)).collect();
    while let Some((node, depth)) = stack.pop() {
        let is_expanded = expanded.contains(&node.record_id);
        rows.push(TreeRow {
            record_id: Some(node.record_id.clone()),
            name: node.name.clone(),
            depth,
            has_children: node.has_children(),
            expanded: is_expanded,
            selected: selected == Some(&node.record_id),
        });
        if is_expanded {
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
    rows
}

/// Expanded keys after toggling `id`; order of the remaining keys is kept.
pub fn toggle_expanded(expanded: &[MenuId], id: &MenuId) -> Vec<MenuId> {
    if expanded.contains(id) {
        expanded.iter().filter(|key| *key != id).cloned().collect()
    } else {
        let mut next = expanded.to_vec();
        next.push(id.clone());
        next
    }
}

#[cfg(test)]
#[path = "tests/tree_view_tests.rs"]
mod tests;
