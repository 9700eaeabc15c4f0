//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod handlers;
pub mod menu;
pub mod notifications;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use notifications::{notify_admin_startup, notify_admin_text};
