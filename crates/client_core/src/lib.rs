use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::MenuId,
    error::{ApiException, ErrorCode},
    protocol::{
        FormMode, FormRequest, FormState, MenuQuery, MenuSearch, MenuStoreState, MenuSubmission,
        PageRequest, StoreIntent, DEFAULT_PAGE_SIZE,
    },
};
use storage::MenuRepository;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub const ADD_FORM_TITLE: &str = "メニュー新規作成";
pub const EDIT_FORM_TITLE: &str = "メニュー編集";

/// Error code carried by an [`ApiException`] anywhere in the error chain.
pub fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ApiException>())
        .map(|api| api.code)
}

#[derive(Debug, Clone)]
pub enum StoreEvent {
    StateChanged(Box<MenuStoreState>),
    IntentFailed {
        intent: &'static str,
        code: Option<ErrorCode>,
        message: String,
    },
}

#[async_trait]
pub trait StoreHandle: Send + Sync {
    async fn dispatch(&self, intent: StoreIntent) -> Result<()>;
    async fn snapshot(&self) -> MenuStoreState;
    fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Holds the menu screen's shared state and applies intents against a repository.
///
/// Intents are applied one at a time; the state lock is held for the whole
/// transition, so concurrent dispatches are serialised in arrival order.
pub struct MenuStore {
    repository: Arc<dyn MenuRepository>,
    default_page_size: u32,
    inner: Mutex<MenuStoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl MenuStore {
    pub fn new(repository: Arc<dyn MenuRepository>) -> Arc<Self> {
        Self::with_page_size(repository, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(repository: Arc<dyn MenuRepository>, default_page_size: u32) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            repository,
            default_page_size: default_page_size.max(1),
            inner: Mutex::new(MenuStoreState::default()),
            events,
        })
    }

    async fn apply(&self, state: &mut MenuStoreState, intent: StoreIntent) -> Result<()> {
        match intent {
            StoreIntent::FetchTree => self.fetch_tree(state).await,
            StoreIntent::Fetch { search, pagination } => {
                self.fetch(state, search, pagination).await
            }
            StoreIntent::LoadForm(request) => self.load_form(state, request).await,
            StoreIntent::Submit(submission) => self.submit(state, submission).await,
            StoreIntent::Delete { record_id } => self.delete(state, &record_id).await,
            StoreIntent::ChangeFormVisible(visible) => {
                state.form.visible = visible;
                Ok(())
            }
            StoreIntent::SaveExpandedKeys(keys) => {
                state.expanded_keys = keys;
                Ok(())
            }
        }
    }

    async fn fetch_tree(&self, state: &mut MenuStoreState) -> Result<()> {
        state.tree_data = self.repository.menu_tree().await?;
        Ok(())
    }

    async fn fetch(
        &self,
        state: &mut MenuStoreState,
        search: Option<MenuSearch>,
        pagination: Option<PageRequest>,
    ) -> Result<()> {
        if let Some(search) = search {
            state.search = search;
        }
        if let Some(pagination) = pagination {
            state.pagination = pagination;
        }

        let (current, page_size) = state.pagination.resolve(self.default_page_size);
        let mut query = MenuQuery {
            search: state.search.clone(),
            current,
            page_size,
        };
        let mut data = self.repository.query_menus(&query).await?;

        // A delete can empty the last page; fall back to the new last page.
        if data.list.is_empty() && query.current > 1 && data.pagination.total > 0 {
            let last_page = data.pagination.total.div_ceil(u64::from(page_size));
            query.current = u32::try_from(last_page).unwrap_or(1).max(1);
            state.pagination.current = Some(query.current);
            data = self.repository.query_menus(&query).await?;
        }

        state.data = data;
        Ok(())
    }

    async fn load_form(&self, state: &mut MenuStoreState, request: FormRequest) -> Result<()> {
        match request {
            FormRequest::Add => {
                state.form = FormState {
                    visible: true,
                    mode: FormMode::Add,
                    title: ADD_FORM_TITLE.to_string(),
                    record_id: None,
                    data: None,
                    submitting: false,
                };
            }
            FormRequest::Edit { id } => {
                state.form = FormState {
                    visible: true,
                    mode: FormMode::Edit,
                    title: EDIT_FORM_TITLE.to_string(),
                    record_id: Some(id.clone()),
                    data: None,
                    submitting: false,
                };
                let record = self
                    .repository
                    .get_menu(&id)
                    .await?
                    .ok_or_else(|| ApiException::not_found(format!("menu {id} not found")))?;
                state.form.data = Some(record);
            }
        }
        Ok(())
    }

    async fn submit(&self, state: &mut MenuStoreState, submission: MenuSubmission) -> Result<()> {
        state.form.submitting = true;
        let saved = match (state.form.mode, state.form.record_id.clone()) {
            (FormMode::Add, _) => self.repository.create_menu(&submission).await,
            (FormMode::Edit, Some(id)) => self.repository.update_menu(&id, &submission).await,
            (FormMode::Edit, None) => Err(anyhow!(ApiException::validation(
                "edit form has no record to update"
            ))),
        };
        state.form.submitting = false;

        let saved = saved?;
        info!(record_id = %saved.record_id, "menu saved");
        state.form.visible = false;
        state.form.data = Some(saved);

        self.fetch(state, None, None).await?;
        self.fetch_tree(state).await
    }

    async fn delete(&self, state: &mut MenuStoreState, record_id: &MenuId) -> Result<()> {
        self.repository.delete_menu(record_id).await?;
        self.fetch(state, None, None).await?;
        self.fetch_tree(state).await
    }
}

#[async_trait]
impl StoreHandle for Arc<MenuStore> {
    async fn dispatch(&self, intent: StoreIntent) -> Result<()> {
        let kind = intent.kind();
        tracing::debug!(intent = kind, "applying store intent");

        let mut state = self.inner.lock().await;
        match self.apply(&mut state, intent).await {
            Ok(()) => {
                let _ = self
                    .events
                    .send(StoreEvent::StateChanged(Box::new(state.clone())));
                Ok(())
            }
            Err(err) => {
                warn!(intent = kind, "store intent failed: {err:#}");
                let _ = self.events.send(StoreEvent::IntentFailed {
                    intent: kind,
                    code: error_code(&err),
                    message: err.to_string(),
                });
                // Partial results (e.g. the submitting flag) still reach observers.
                let _ = self
                    .events
                    .send(StoreEvent::StateChanged(Box::new(state.clone())));
                Err(err)
            }
        }
    }

    async fn snapshot(&self) -> MenuStoreState {
        self.inner.lock().await.clone()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
