use serde::{Deserialize, Serialize};

use crate::domain::{ActionRow, MenuId, MenuRecord, MenuTreeNode, Visibility, VisibilityError};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Visibility filter of the search form: all, shown only, hidden only.
/// Travels as `-1` / `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum HiddenFilter {
    #[default]
    All,
    Only(Visibility),
}

impl HiddenFilter {
    pub fn matches(self, hidden: Visibility) -> bool {
        match self {
            HiddenFilter::All => true,
            HiddenFilter::Only(wanted) => wanted == hidden,
        }
    }
}

impl TryFrom<i64> for HiddenFilter {
    type Error = VisibilityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value == -1 {
            return Ok(HiddenFilter::All);
        }
        Visibility::try_from(value).map(HiddenFilter::Only)
    }
}

impl From<HiddenFilter> for i64 {
    fn from(value: HiddenFilter) -> Self {
        match value {
            HiddenFilter::All => -1,
            HiddenFilter::Only(v) => v.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSearch {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub hidden: HiddenFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MenuId>,
}

impl MenuSearch {
    pub fn with_parent(parent_id: Option<MenuId>) -> Self {
        Self {
            parent_id,
            ..Self::default()
        }
    }

    /// Copy of `self` with only the parent filter replaced.
    pub fn merged_parent(&self, parent_id: Option<MenuId>) -> Self {
        Self {
            parent_id,
            ..self.clone()
        }
    }
}

/// Requested page; missing fields fall back to the first page / default size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn page(current: u32, page_size: u32) -> Self {
        Self {
            current: Some(current),
            page_size: Some(page_size),
        }
    }

    pub fn resolve(&self, default_page_size: u32) -> (u32, u32) {
        let current = self.current.filter(|c| *c > 0).unwrap_or(1);
        let page_size = self
            .page_size
            .filter(|s| *s > 0)
            .unwrap_or(default_page_size.max(1));
        (current, page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData<T> {
    pub list: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Default for PageData<T> {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            pagination: Pagination::default(),
        }
    }
}

/// Fully resolved list query handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuQuery {
    pub search: MenuSearch,
    pub current: u32,
    pub page_size: u32,
}

impl MenuQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.current.saturating_sub(1)) * u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormMode {
    #[default]
    #[serde(rename = "A")]
    Add,
    #[serde(rename = "E")]
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FormRequest {
    Add,
    Edit { id: MenuId },
}

/// Everything the detail form submits for one menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSubmission {
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
}

impl From<&MenuRecord> for MenuSubmission {
    fn from(record: &MenuRecord) -> Self {
        Self {
            name: record.name.clone(),
            sequence: record.sequence,
            hidden: record.hidden,
            icon: record.icon.clone(),
            router: record.router.clone(),
            parent_id: record.parent_id.clone(),
            actions: record.actions.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub visible: bool,
    pub mode: FormMode,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<MenuId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MenuRecord>,
    pub submitting: bool,
}

/// Closed set of store transitions the screen may request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum StoreIntent {
    FetchTree,
    Fetch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        search: Option<MenuSearch>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pagination: Option<PageRequest>,
    },
    LoadForm(FormRequest),
    Submit(MenuSubmission),
    Delete {
        record_id: MenuId,
    },
    ChangeFormVisible(bool),
    SaveExpandedKeys(Vec<MenuId>),
}

impl StoreIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreIntent::FetchTree => "fetch_tree",
            StoreIntent::Fetch { .. } => "fetch",
            StoreIntent::LoadForm(_) => "load_form",
            StoreIntent::Submit(_) => "submit",
            StoreIntent::Delete { .. } => "delete",
            StoreIntent::ChangeFormVisible(_) => "change_form_visible",
            StoreIntent::SaveExpandedKeys(_) => "save_expanded_keys",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuStoreState {
    pub data: PageData<MenuRecord>,
    pub tree_data: Vec<MenuTreeNode>,
    pub expanded_keys: Vec<MenuId>,
    pub search: MenuSearch,
    pub pagination: PageRequest,
    pub form: FormState,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
