//! Controller layer: UI events, screen state, forms, and command orchestration.

pub mod action_editor;
pub mod events;
pub mod menu_form;
pub mod menu_screen;
pub mod orchestration;
pub mod search_form;
pub mod tree_view;
