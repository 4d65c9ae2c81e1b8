//! Registration reminder lifecycle
//!
//! Every `/start` schedules a profile check a few days out. A background
//! sweep fires the due checks: completed profiles drop their check, the rest
//! get a reminder or are removed from the chat depending on the configured
//! policy.

pub mod db;
pub mod scheduler;

pub use scheduler::{start_reminder_scheduler, ReminderPolicy};
