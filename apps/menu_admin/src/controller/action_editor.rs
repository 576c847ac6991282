//! Editable action sub-table of the menu form.
//!
//! The editor keeps its own copy of the rows, accepts a new source from its
//! owner through [`ActionListEditor::sync`], and reports every local mutation
//! through a single change callback carrying the full row list.

use std::collections::HashSet;

use shared::domain::{template_action_rows, ActionDraft, ActionKey, ActionPatch, ActionRow};

pub type ChangeCallback = Box<dyn FnMut(&[ActionRow]) + Send>;

/// Materialises rows from an external source, generating keys only for rows
/// that arrive without one.
pub fn ingest(source: Option<&[ActionDraft]>) -> Vec<ActionRow> {
    let Some(source) = source else {
        return Vec::new();
    };
    source
        .iter()
        .map(|draft| ActionRow {
            key: draft.usable_key().cloned().unwrap_or_else(ActionKey::generate),
            code: draft.code.clone(),
            name: draft.name.clone(),
        })
        .collect()
}

/// Merges an incoming source over the current local rows.
///
/// Incoming order wins. Keyed rows are taken as given. A keyless incoming row
/// that matches the local row at the same position (same code and name)
/// keeps that local key, so feeding the same keyless source twice does not
/// churn keys.
pub fn reconcile(local: &[ActionRow], incoming: Option<&[ActionDraft]>) -> Vec<ActionRow> {
    let Some(incoming) = incoming else {
        return Vec::new();
    };
    let explicit: HashSet<&ActionKey> = incoming.iter().filter_map(ActionDraft::usable_key).collect();

    incoming
        .iter()
        .enumerate()
        .map(|(idx, draft)| {
            if let Some(key) = draft.usable_key() {
                return ActionRow {
                    key: key.clone(),
                    code: draft.code.clone(),
                    name: draft.name.clone(),
                };
            }
            match local.get(idx) {
                Some(existing)
                    if existing.code == draft.code
                        && existing.name == draft.name
                        && !explicit.contains(&existing.key) =>
                {
                    existing.clone()
                }
                _ => ActionRow {
                    key: ActionKey::generate(),
                    code: draft.code.clone(),
                    name: draft.name.clone(),
                },
            }
        })
        .collect()
}

#[derive(Default)]
pub struct ActionListEditor {
    rows: Vec<ActionRow>,
    on_change: Option<ChangeCallback>,
}

impl std::fmt::Debug for ActionListEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionListEditor")
            .field("rows", &self.rows)
            .field("has_on_change", &self.on_change.is_some())
            .finish()
    }
}

impl ActionListEditor {
    pub fn new(source: Option<&[ActionDraft]>) -> Self {
        Self {
            rows: ingest(source),
            on_change: None,
        }
    }

    pub fn with_on_change(mut self, on_change: impl FnMut(&[ActionRow]) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    pub fn rows(&self) -> &[ActionRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a delete control should be offered at all.
    pub fn can_delete(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Adopts a new source from the owner. Returns whether the rows changed.
    /// The owner supplied the data, so no change notification is sent.
    pub fn sync(&mut self, source: Option<&[ActionDraft]>) -> bool {
        let merged = reconcile(&self.rows, source);
        if merged == self.rows {
            return false;
        }
        self.rows = merged;
        true
    }

    pub fn add_blank_row(&mut self) -> &ActionRow {
        self.rows.push(ActionRow::blank());
        self.notify();
        let last = self.rows.len() - 1;
        &self.rows[last]
    }

    /// Appends the template rows whose key is not present yet. Returns how
    /// many rows were appended.
    pub fn add_template_rows(&mut self) -> usize {
        let existing: HashSet<ActionKey> = self.rows.iter().map(|row| row.key.clone()).collect();
        let before = self.rows.len();
        self.rows.extend(
            template_action_rows()
                .into_iter()
                .filter(|row| !existing.contains(&row.key)),
        );
        let appended = self.rows.len() - before;
        self.notify();
        appended
    }

    /// Removes every row with `key`. Returns how many were removed.
    pub fn delete_row(&mut self, key: &ActionKey) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| row.key != *key);
        let removed = before - self.rows.len();
        self.notify();
        removed
    }

    /// Merges `patch` over the row with `key`. A key that is no longer present
    /// is ignored without notifying.
    pub fn update_row(&mut self, key: &ActionKey, patch: &ActionPatch) -> bool {
        let Some(idx) = self.rows.iter().position(|row| row.key == *key) else {
            tracing::debug!(key = %key, "ignoring update for unknown action row");
            return false;
        };
        self.rows[idx] = patch.apply_to(&self.rows[idx]);
        self.notify();
        true
    }

    fn notify(&mut self) {
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&self.rows);
        }
    }
}

#[cfg(test)]
#[path = "tests/action_editor_tests.rs"]
mod tests;
