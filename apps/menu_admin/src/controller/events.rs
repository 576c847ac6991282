//! UI/backend events and error modeling for the menu admin controller.

use shared::{error::ErrorCode, protocol::MenuStoreState};

pub enum UiEvent {
    Info(String),
    StoreUpdated(Box<MenuStoreState>),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Conflict,
    Storage,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Fetch,
    Form,
    Delete,
    General,
}

impl UiErrorContext {
    /// Context for a failed store intent, keyed by its `StoreIntent::kind`.
    pub fn for_intent(intent: &str) -> Self {
        match intent {
            "fetch" | "fetch_tree" => UiErrorContext::Fetch,
            "load_form" | "submit" => UiErrorContext::Form,
            "delete" => UiErrorContext::Delete,
            _ => UiErrorContext::General,
        }
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Conflict => "Conflict",
        UiErrorCategory::Storage => "Storage",
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("required")
            || message_lower.contains("must be")
            || message_lower.contains("at most")
            || message_lower.contains("cannot be")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("has child")
            || message_lower.contains("children")
            || message_lower.contains("conflict")
        {
            UiErrorCategory::Conflict
        } else if message_lower.contains("database")
            || message_lower.contains("sqlite")
            || message_lower.contains("migration")
            || message_lower.contains("disk")
        {
            UiErrorCategory::Storage
        } else if message_lower.contains("queue")
            || message_lower.contains("disconnect")
            || message_lower.contains("runtime")
            || message_lower.contains("unavailable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Error for a failed store intent. A typed code beats message sniffing.
    pub fn from_store_failure(intent: &str, code: Option<ErrorCode>, message: impl Into<String>) -> Self {
        let context = UiErrorContext::for_intent(intent);
        let mut err = Self::from_message(context, message);
        match code {
            Some(ErrorCode::Validation) | Some(ErrorCode::NotFound) => {
                err.category = UiErrorCategory::Validation
            }
            Some(ErrorCode::Conflict) => err.category = UiErrorCategory::Conflict,
            None => {}
        }
        err
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status line text, e.g. `Conflict error: menu has children`.
    pub fn status_text(&self) -> String {
        format!("{} error: {}", err_label(self.category), self.message)
    }

    /// Whether the failure deserves the banner rather than only the status line.
    pub fn wants_banner(&self) -> bool {
        matches!(
            self.context,
            UiErrorContext::BackendStartup | UiErrorContext::Form | UiErrorContext::Delete
        ) || self.category == UiErrorCategory::Storage
    }
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
