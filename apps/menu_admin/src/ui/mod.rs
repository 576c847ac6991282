//! UI layer for the menu admin: app shell and panels.

pub mod app;
pub mod panels;

pub use app::{MenuAdminApp, PersistedViewSettings, SETTINGS_STORAGE_KEY};
