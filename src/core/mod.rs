//! Core utilities: configuration, logging, metrics and the Excel export

pub mod config;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod metrics_server;

// Re-exports for convenience
pub use logging::init_logger;
