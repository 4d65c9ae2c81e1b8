//! Dispatcher schema and command handlers

mod commands;
mod schema;
mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
