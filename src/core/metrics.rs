//! Metrics collection using Prometheus
//!
//! A handful of business counters; served by `metrics_server` when
//! `METRICS_ENABLED` is set.

use lazy_static::lazy_static;
use prometheus::{register_counter, Counter};

lazy_static! {
    /// Total /start commands processed
    pub static ref STARTS_TOTAL: Counter = register_counter!(
        "reclin_starts_total",
        "Total /start commands processed"
    )
    .unwrap();

    /// Completed web-form registrations
    pub static ref REGISTRATIONS_TOTAL: Counter = register_counter!(
        "reclin_registrations_total",
        "Total completed registrations via the web form"
    )
    .unwrap();

    /// Broadcast messages delivered
    pub static ref BROADCAST_SENT_TOTAL: Counter = register_counter!(
        "reclin_broadcast_sent_total",
        "Broadcast messages delivered to recipients"
    )
    .unwrap();

    /// Broadcast sends that failed
    pub static ref BROADCAST_FAILED_TOTAL: Counter = register_counter!(
        "reclin_broadcast_failed_total",
        "Broadcast sends that failed"
    )
    .unwrap();

    /// Reminder messages sent to users with incomplete profiles
    pub static ref REMINDERS_SENT_TOTAL: Counter = register_counter!(
        "reclin_reminders_sent_total",
        "Reminders sent to users with incomplete profiles"
    )
    .unwrap();

    /// Users removed from the chat for incomplete profiles
    pub static ref KICKS_TOTAL: Counter = register_counter!(
        "reclin_kicks_total",
        "Users removed from the community chat for incomplete profiles"
    )
    .unwrap();

    /// Bot uptime counter, incremented once a minute
    pub static ref BOT_UPTIME_SECONDS: Counter = register_counter!(
        "reclin_bot_uptime_seconds",
        "Approximate bot uptime in seconds"
    )
    .unwrap();
}

/// Force-register all metrics so they show up on /metrics before the first
/// increment
pub fn init_metrics() {
    lazy_static::initialize(&STARTS_TOTAL);
    lazy_static::initialize(&REGISTRATIONS_TOTAL);
    lazy_static::initialize(&BROADCAST_SENT_TOTAL);
    lazy_static::initialize(&BROADCAST_FAILED_TOTAL);
    lazy_static::initialize(&REMINDERS_SENT_TOTAL);
    lazy_static::initialize(&KICKS_TOTAL);
    lazy_static::initialize(&BOT_UPTIME_SECONDS);
}
