//! Detail form for creating or editing one menu.
//!
//! The embedded [`ActionListEditor`] reports its rows over a channel; the form
//! drains that channel into its own value with [`MenuForm::pump_action_changes`].

use crossbeam_channel::{unbounded, Receiver};
use shared::{
    domain::{subtree_ids, ActionDraft, ActionRow, MenuId, MenuTreeNode, Visibility},
    protocol::{FormMode, FormState, MenuSubmission},
};
use storage::MAX_MENU_NAME_LEN;
use thiserror::Error;

use crate::controller::action_editor::ActionListEditor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuFormError {
    #[error("menu name is required")]
    NameRequired,
    #[error("menu name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("a menu cannot be its own parent")]
    SelfParent,
}

#[derive(Debug)]
pub struct MenuForm {
    pub mode: FormMode,
    pub record_id: Option<MenuId>,
    pub name: String,
    pub sequence: i64,
    pub hidden: Visibility,
    pub icon: String,
    pub router: String,
    pub parent_id: Option<MenuId>,
    actions: Vec<ActionRow>,
    editor: ActionListEditor,
    action_changes: Receiver<Vec<ActionRow>>,
}

impl Default for MenuForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuForm {
    pub fn new() -> Self {
        let (changes_tx, action_changes) = unbounded::<Vec<ActionRow>>();
        let editor = ActionListEditor::new(None).with_on_change(move |rows| {
            if changes_tx.send(rows.to_vec()).is_err() {
                tracing::debug!("action change receiver dropped");
            }
        });
        Self {
            mode: FormMode::Add,
            record_id: None,
            name: String::new(),
            sequence: 0,
            hidden: Visibility::Shown,
            icon: String::new(),
            router: String::new(),
            parent_id: None,
            actions: Vec::new(),
            editor,
            action_changes,
        }
    }

    /// Re-syncs every field from the store's form state.
    pub fn load(&mut self, form: &FormState) {
        // Anything still queued belongs to the previous record.
        while self.action_changes.try_recv().is_ok() {}

        self.mode = form.mode;
        self.record_id = form.record_id.clone();
        match &form.data {
            Some(record) => {
                self.name = record.name.clone();
                self.sequence = record.sequence;
                self.hidden = record.hidden;
                self.icon = record.icon.clone();
                self.router = record.router.clone();
                self.parent_id = record.parent_id.clone();
                let drafts: Vec<ActionDraft> = record.actions.iter().map(ActionDraft::from).collect();
                self.editor.sync(Some(drafts.as_slice()));
            }
            None => {
                self.name.clear();
                self.sequence = 0;
                self.hidden = Visibility::Shown;
                self.icon.clear();
                self.router.clear();
                self.parent_id = None;
                self.editor.sync(None);
            }
        }
        self.actions = self.editor.rows().to_vec();
    }

    pub fn editor(&self) -> &ActionListEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut ActionListEditor {
        &mut self.editor
    }

    /// Action rows as last reported by the editor.
    pub fn actions(&self) -> &[ActionRow] {
        &self.actions
    }

    /// Applies every queued editor notification; the latest one wins.
    /// Returns whether any arrived.
    pub fn pump_action_changes(&mut self) -> bool {
        let mut changed = false;
        while let Ok(rows) = self.action_changes.try_recv() {
            self.actions = rows;
            changed = true;
        }
        changed
    }

    pub fn validate(&mut self) -> Result<MenuSubmission, MenuFormError> {
        self.pump_action_changes();

        let name = self.name.trim();
        if name.is_empty() {
            return Err(MenuFormError::NameRequired);
        }
        if name.chars().count() > MAX_MENU_NAME_LEN {
            return Err(MenuFormError::NameTooLong {
                max: MAX_MENU_NAME_LEN,
            });
        }
        if self.record_id.is_some() && self.parent_id == self.record_id {
            return Err(MenuFormError::SelfParent);
        }

        Ok(MenuSubmission {
            name: name.to_string(),
            sequence: self.sequence,
            hidden: self.hidden,
            icon: self.icon.trim().to_string(),
            router: self.router.trim().to_string(),
            parent_id: self.parent_id.clone(),
            actions: self.actions.clone(),
        })
    }
}

/// Candidate parents for the form's parent picker: every node outside the
/// subtree of `editing`, depth-first, paired with its depth.
pub fn parent_options(tree: &[MenuTreeNode], editing: Option<&MenuId>) -> Vec<(MenuId, String, usize)> {
    let excluded = editing.map(|id| subtree_ids(tree, id)).unwrap_or_default();
    let mut out = Vec::new();
    let mut stack: Vec<(&MenuTreeNode, usize)> = tree.iter().rev().map(|node| (node, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        if excluded.contains(&node.record_id) {
            continue;
        }
        out.push((node.record_id.clone(), node.name.clone(), depth));
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    out
}

#[cfg(test)]
#[path = "tests/menu_form_tests.rs"]
mod tests;
