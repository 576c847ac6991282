use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id_newtype!(MenuId);
string_id_newtype!(ActionKey);

#[derive(Debug, Error)]
#[error("invalid visibility flag {0}; expected 0 (shown) or 1 (hidden)")]
pub struct VisibilityError(pub i64);

/// Menu visibility. Travels as the integer flag `0` (shown) / `1` (hidden).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Visibility {
    #[default]
    Shown,
    Hidden,
}

impl Visibility {
    pub fn is_hidden(self) -> bool {
        self == Visibility::Hidden
    }

    pub fn label(self) -> &'static str {
        match self {
            Visibility::Shown => "表示",
            Visibility::Hidden => "非表示",
        }
    }
}

impl TryFrom<i64> for Visibility {
    type Error = VisibilityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Visibility::Shown),
            1 => Ok(Visibility::Hidden),
            other => Err(VisibilityError(other)),
        }
    }
}

impl From<Visibility> for i64 {
    fn from(value: Visibility) -> Self {
        match value {
            Visibility::Shown => 0,
            Visibility::Hidden => 1,
        }
    }
}

/// A permission-code entry attached to a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    pub key: ActionKey,
    pub code: String,
    pub name: String,
}

impl ActionRow {
    pub fn new(key: impl Into<ActionKey>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn blank() -> Self {
        Self {
            key: ActionKey::generate(),
            code: String::new(),
            name: String::new(),
        }
    }
}

/// Canonical permission codes offered as a one-click bulk insert, in order.
pub const TEMPLATE_ACTIONS: [(&str, &str); 4] = [
    ("add", "新規"),
    ("edit", "編集"),
    ("del", "削除"),
    ("query", "検索"),
];

/// The template actions as rows keyed by their code.
pub fn template_action_rows() -> Vec<ActionRow> {
    TEMPLATE_ACTIONS
        .iter()
        .map(|(code, name)| ActionRow::new(*code, *code, *name))
        .collect()
}

/// Action row as it arrives from outside; the key may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<ActionKey>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

impl ActionDraft {
    pub fn keyless(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: None,
            code: code.into(),
            name: name.into(),
        }
    }

    /// Present and non-empty key, if any.
    pub fn usable_key(&self) -> Option<&ActionKey> {
        self.key.as_ref().filter(|key| !key.is_empty())
    }
}

impl From<ActionRow> for ActionDraft {
    fn from(row: ActionRow) -> Self {
        Self {
            key: Some(row.key),
            code: row.code,
            name: row.name,
        }
    }
}

impl From<&ActionRow> for ActionDraft {
    fn from(row: &ActionRow) -> Self {
        row.clone().into()
    }
}

/// Partial update for one action row; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ActionPatch {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            name: None,
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            code: None,
            name: Some(name.into()),
        }
    }

    pub fn apply_to(&self, row: &ActionRow) -> ActionRow {
        ActionRow {
            key: row.key.clone(),
            code: self.code.clone().unwrap_or_else(|| row.code.clone()),
            name: self.name.clone().unwrap_or_else(|| row.name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRecord {
    pub record_id: MenuId,
    pub name: String,
    pub sequence: i64,
    pub hidden: Visibility,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub router: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MenuId>,
    #[serde(default)]
    pub actions: Vec<ActionRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A node of the menu tree as the store hands it to the screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuTreeNode {
    pub record_id: MenuId,
    pub name: String,
    pub sequence: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MenuId>,
    #[serde(default)]
    pub children: Vec<MenuTreeNode>,
}

impl MenuTreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Builds the nested tree from flat records.
///
/// Records whose parent is unknown become roots. Records caught in a parent
/// cycle are not reachable from any root and are dropped. Siblings are ordered
/// by `sequence` descending, then by name. The construction is iterative so
/// that deep trees do not grow the call stack.
pub fn build_menu_tree(records: &[MenuRecord]) -> Vec<MenuTreeNode> {
    let known: HashSet<&MenuId> = records.iter().map(|r| &r.record_id).collect();

    let mut children_of: HashMap<Option<&MenuId>, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        let parent = record
            .parent_id
            .as_ref()
            .filter(|p| known.contains(p) && **p != record.record_id);
        children_of.entry(parent).or_default().push(idx);
    }
    for indices in children_of.values_mut() {
        indices.sort_by(|a, b| {
            let (a, b) = (&records[*a], &records[*b]);
            b.sequence.cmp(&a.sequence).then_with(|| a.name.cmp(&b.name))
        });
    }

    // Post-order assembly: a node is materialised once all its children are.
    let mut finished: HashMap<usize, MenuTreeNode> = HashMap::new();
    let mut visited: HashSet<usize> = HashSet::new();
    let roots = children_of.get(&None).cloned().unwrap_or_default();
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|idx| (*idx, false)).collect();

    while let Some((idx, children_done)) = stack.pop() {
        let record = &records[idx];
        let child_indices = children_of
            .get(&Some(&record.record_id))
            .map(Vec::as_slice)
            .unwrap_or_default();

        if !children_done {
            if !visited.insert(idx) {
                continue;
            }
            stack.push((idx, true));
            for child in child_indices.iter().rev() {
                if !visited.contains(child) {
                    stack.push((*child, false));
                }
            }
            continue;
        }

        let children = child_indices
            .iter()
            .filter_map(|child| finished.remove(child))
            .collect();
        finished.insert(
            idx,
            MenuTreeNode {
                record_id: record.record_id.clone(),
                name: record.name.clone(),
                sequence: record.sequence,
                parent_id: record.parent_id.clone(),
                children,
            },
        );
    }

    roots
        .iter()
        .filter_map(|idx| finished.remove(idx))
        .collect()
}

/// Ids of `root` and every node below it in `tree`.
pub fn subtree_ids(tree: &[MenuTreeNode], root: &MenuId) -> HashSet<MenuId> {
    let mut out = HashSet::new();
    let mut stack: Vec<(&MenuTreeNode, bool)> = tree.iter().map(|n| (n, false)).collect();
    while let Some((node, inside)) = stack.pop() {
        let inside = inside || node.record_id == *root;
        if inside {
            out.insert(node.record_id.clone());
        }
        stack.extend(node.children.iter().map(|c| (c, inside)));
    }
    out
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
