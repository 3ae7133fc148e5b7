pub mod app;
pub mod chat;
pub mod footer;
pub mod header;
pub mod settings_modal;
pub mod sidebar;
pub mod welcome;
