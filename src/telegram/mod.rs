//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod broadcast;
pub mod handlers;
pub mod invite;
pub mod notifications;
pub mod texts;
pub mod webapp;
pub mod webapp_auth;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use webapp::{create_webapp_router, run_webapp_server};
