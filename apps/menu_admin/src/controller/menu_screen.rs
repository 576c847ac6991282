//! Menu management screen: turns gestures into store intents and projects the
//! store state into what the panels draw.

use shared::{
    domain::{MenuId, MenuRecord},
    protocol::{
        FormMode, FormRequest, FormState, MenuSearch, MenuStoreState, MenuSubmission,
        PageRequest, Pagination, StoreIntent,
    },
};

use crate::controller::{
    menu_form::{MenuForm, MenuFormError},
    orchestration::IntentSink,
    search_form::{SearchForm, SearchFormError},
    tree_view::{flatten_tree, toggle_expanded, TreeRow},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedMenu {
    pub record_id: MenuId,
    pub name: String,
}

/// A delete waiting for the user's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub record_id: MenuId,
    pub name: String,
}

impl PendingDelete {
    pub fn prompt(&self) -> String {
        format!("削除確認【メニューデータ：{}】？", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub record_id: MenuId,
    pub name: String,
    pub sequence: i64,
    pub hidden: &'static str,
    pub icon: String,
    pub router: String,
    pub selected: bool,
}

/// What the detail form was last loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormSignature {
    mode: FormMode,
    record_id: Option<MenuId>,
    data: Option<MenuRecord>,
}

impl FormSignature {
    fn of(form: &FormState) -> Option<Self> {
        form.visible.then(|| Self {
            mode: form.mode,
            record_id: form.record_id.clone(),
            data: form.data.clone(),
        })
    }
}

pub struct MenuScreen<S: IntentSink> {
    sink: S,
    state: MenuStoreState,
    selection: Option<SelectedMenu>,
    pending_delete: Option<PendingDelete>,
    parent_filter: Option<MenuId>,
    pub search_form: SearchForm,
    search_error: Option<SearchFormError>,
    pub form: MenuForm,
    form_error: Option<MenuFormError>,
    form_signature: Option<FormSignature>,
}

impl<S: IntentSink> MenuScreen<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: MenuStoreState::default(),
            selection: None,
            pending_delete: None,
            parent_filter: None,
            search_form: SearchForm::default(),
            search_error: None,
            form: MenuForm::new(),
            form_error: None,
            form_signature: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn state(&self) -> &MenuStoreState {
        &self.state
    }

    pub fn selection(&self) -> Option<&SelectedMenu> {
        self.selection.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    pub fn parent_filter(&self) -> Option<&MenuId> {
        self.parent_filter.as_ref()
    }

    pub fn search_error(&self) -> Option<&SearchFormError> {
        self.search_error.as_ref()
    }

    pub fn form_error(&self) -> Option<&MenuFormError> {
        self.form_error.as_ref()
    }

    pub fn mount(&mut self) {
        self.sink.dispatch(StoreIntent::FetchTree);
        self.sink.dispatch(StoreIntent::Fetch {
            search: Some(MenuSearch::default()),
            pagination: Some(PageRequest::default()),
        });
    }

    /// Reloads the tree and the current page with the saved search.
    pub fn refresh(&mut self) {
        self.sink.dispatch(StoreIntent::FetchTree);
        self.sink.dispatch(StoreIntent::Fetch {
            search: None,
            pagination: None,
        });
    }

    /// Keeps only the last reported key and row; empty input clears.
    pub fn select_rows(&mut self, keys: &[MenuId], rows: &[MenuRecord]) {
        self.selection = match (keys.last(), rows.last()) {
            (Some(record_id), Some(row)) => Some(SelectedMenu {
                record_id: record_id.clone(),
                name: row.name.clone(),
            }),
            _ => None,
        };
    }

    /// Table click: selects `row`, or clears when it is already selected.
    pub fn toggle_row(&mut self, row: &MenuRecord) {
        let already = self
            .selection
            .as_ref()
            .is_some_and(|selected| selected.record_id == row.record_id);
        if already {
            self.select_rows(&[], &[]);
        } else {
            self.select_rows(std::slice::from_ref(&row.record_id), std::slice::from_ref(row));
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn click_add(&mut self) {
        self.sink.dispatch(StoreIntent::LoadForm(FormRequest::Add));
    }

    pub fn click_edit(&mut self) {
        let Some(selected) = &self.selection else {
            return;
        };
        self.sink.dispatch(StoreIntent::LoadForm(FormRequest::Edit {
            id: selected.record_id.clone(),
        }));
    }

    pub fn click_delete(&mut self) {
        let Some(selected) = &self.selection else {
            return;
        };
        self.pending_delete = Some(PendingDelete {
            record_id: selected.record_id.clone(),
            name: selected.name.clone(),
        });
    }

    pub fn confirm_delete(&mut self) {
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        tracing::info!(record_id = %pending.record_id, "delete confirmed");
        self.sink.dispatch(StoreIntent::Delete {
            record_id: pending.record_id,
        });
        self.clear_selection();
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Only the page changes; the store keeps its saved search.
    pub fn change_page(&mut self, current: u32, page_size: u32) {
        self.sink.dispatch(StoreIntent::Fetch {
            search: None,
            pagination: Some(PageRequest::page(current, page_size)),
        });
        self.clear_selection();
    }

    /// Returns false when the search form is invalid; nothing is dispatched then.
    pub fn submit_search(&mut self) -> bool {
        let search = match self.search_form.validate() {
            Ok(search) => search,
            Err(err) => {
                tracing::debug!(error = %err, "search form rejected");
                self.search_error = Some(err);
                return false;
            }
        };
        self.search_error = None;
        self.sink.dispatch(StoreIntent::Fetch {
            search: Some(search.merged_parent(self.parent_filter.clone())),
            pagination: Some(PageRequest::default()),
        });
        self.clear_selection();
        true
    }

    pub fn reset_search(&mut self) {
        self.search_form.reset();
        self.search_error = None;
        self.sink.dispatch(StoreIntent::Fetch {
            search: Some(MenuSearch::with_parent(self.parent_filter.clone())),
            pagination: Some(PageRequest::default()),
        });
    }

    /// Filters the list to the children of `node`; `None` is the synthetic root.
    pub fn select_tree_node(&mut self, node: Option<MenuId>) {
        self.parent_filter = node.filter(|id| !id.is_empty());
        self.sink.dispatch(StoreIntent::Fetch {
            search: Some(self.state.search.merged_parent(self.parent_filter.clone())),
            pagination: Some(PageRequest::default()),
        });
    }

    /// Tree click: a second click on the filtering node deselects it.
    pub fn click_tree_node(&mut self, node: Option<MenuId>) {
        if node.is_some() && node == self.parent_filter {
            self.select_tree_node(None);
        } else {
            self.select_tree_node(node);
        }
    }

    pub fn expand_tree(&mut self, keys: Vec<MenuId>) {
        self.sink.dispatch(StoreIntent::SaveExpandedKeys(keys));
    }

    pub fn toggle_tree_node(&mut self, id: &MenuId) {
        let keys = toggle_expanded(&self.state.expanded_keys, id);
        self.expand_tree(keys);
    }

    pub fn submit_form(&mut self, submission: MenuSubmission) {
        self.sink.dispatch(StoreIntent::Submit(submission));
        self.clear_selection();
    }

    /// Validates the detail form and submits it. Returns false on a local
    /// validation failure, which is kept for display.
    pub fn submit_current_form(&mut self) -> bool {
        match self.form.validate() {
            Ok(submission) => {
                self.form_error = None;
                self.submit_form(submission);
                true
            }
            Err(err) => {
                self.form_error = Some(err);
                false
            }
        }
    }

    pub fn cancel_form(&mut self) {
        self.form_error = None;
        self.sink.dispatch(StoreIntent::ChangeFormVisible(false));
    }

    /// Replaces the projected state. The detail form is reloaded only when the
    /// store opened it for a different record or delivered new data.
    pub fn apply_store_state(&mut self, state: MenuStoreState) {
        let signature = FormSignature::of(&state.form);
        if signature.is_some() && signature != self.form_signature {
            self.form.load(&state.form);
            self.form_error = None;
            if state.form.mode == FormMode::Add && state.form.data.is_none() {
                self.form.parent_id = self.parent_filter.clone();
            }
        }
        self.form_signature = signature;
        self.state = state;
    }

    pub fn tree_rows(&self) -> Vec<TreeRow> {
        flatten_tree(
            &self.state.tree_data,
            &self.state.expanded_keys,
            self.parent_filter.as_ref(),
        )
    }

    pub fn table_rows(&self) -> Vec<TableRow> {
        let selected = self.selection.as_ref().map(|s| &s.record_id);
        self.state
            .data
            .list
            .iter()
            .map(|record| TableRow {
                record_id: record.record_id.clone(),
                name: record.name.clone(),
                sequence: record.sequence,
                hidden: record.hidden.label(),
                icon: record.icon.clone(),
                router: record.router.clone(),
                selected: selected == Some(&record.record_id),
            })
            .collect()
    }

    pub fn record(&self, id: &MenuId) -> Option<&MenuRecord> {
        self.state.data.list.iter().find(|record| record.record_id == *id)
    }

    pub fn pagination(&self) -> Pagination {
        self.state.data.pagination
    }

    pub fn page_count(&self) -> u32 {
        let pagination = self.pagination();
        let size = u64::from(pagination.page_size.max(1));
        let pages = pagination.total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn form_state(&self) -> &FormState {
        &self.state.form
    }
}

#[cfg(test)]
#[path = "tests/menu_screen_tests.rs"]
mod tests;
