//! Reclin bot - Telegram onboarding bot for the Терапия|Reclin community
//!
//! This library provides all the core functionality for the bot: invite link
//! issuing, the registration web form, reminder scheduling for unregistered
//! users, admin broadcast and the user list export.
//!
//! # Module Structure
//!
//! - `core`: configuration, logging, metrics and the Excel export
//! - `storage`: database pool, the `users` table and migrations
//! - `reminders`: the registration-check scheduler and its table
//! - `telegram`: bot commands, handlers, broadcast and the web app

pub mod core;
pub mod reminders;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use self::core::config;
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
pub use telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, HandlerError};
