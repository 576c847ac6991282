//! List search form: menu name and visibility filter.

use shared::protocol::{HiddenFilter, MenuSearch};
use thiserror::Error;

pub const MAX_SEARCH_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchFormError {
    #[error("menu name filter must be at most {max} characters")]
    NameTooLong { max: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub name: String,
    pub hidden: HiddenFilter,
}

impl SearchForm {
    /// Search criteria without any parent filter; the screen adds that.
    pub fn validate(&self) -> Result<MenuSearch, SearchFormError> {
        let name = self.name.trim();
        if name.chars().count() > MAX_SEARCH_NAME_LEN {
            return Err(SearchFormError::NameTooLong {
                max: MAX_SEARCH_NAME_LEN,
            });
        }
        Ok(MenuSearch {
            name: name.to_string(),
            hidden: self.hidden,
            parent_id: None,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
