use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot
///
/// Everything is read once from the environment (a `.env` file is loaded in
/// `main` before the first access) and cached in `Lazy` statics.

/// SQLite database file path
/// Read from DATABASE_PATH environment variable
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Log file path for the file half of the combined logger
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "reclin-bot.log".to_string()));

/// Bot token, same variable teloxide's `Bot::from_env` reads.
/// Needed directly for the Web App initData signature check.
pub static BOT_TOKEN: Lazy<String> =
    Lazy::new(|| env::var("TELOXIDE_TOKEN").unwrap_or_default());

/// The community chat the bot issues invites for and removes users from.
/// Read from COMMUNITY_CHAT_ID; 0 means "not configured" and is rejected at
/// startup.
pub static COMMUNITY_CHAT_ID: Lazy<i64> = Lazy::new(|| {
    env::var("COMMUNITY_CHAT_ID")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
});

/// Admin access configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Admin user IDs (comma-separated)
    /// Read from ADMIN_IDS environment variable
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default()
    });

    /// Admin user ID for direct notifications (startup, new users)
    /// Read from ADMIN_USER_ID or fallback to first ADMIN_IDS entry
    pub static ADMIN_USER_ID: Lazy<i64> = Lazy::new(|| {
        env::var("ADMIN_USER_ID")
            .ok()
            .and_then(|s| s.parse().ok())
            .or_else(|| ADMIN_IDS.first().copied())
            .unwrap_or(0)
    });

    #[cfg(test)]
    mod tests {
        use super::parse_admin_ids;

        #[test]
        fn parses_commas_and_whitespace() {
            assert_eq!(parse_admin_ids("1, 2,3\n4"), vec![1, 2, 3, 4]);
            assert_eq!(parse_admin_ids(""), Vec::<i64>::new());
            assert_eq!(parse_admin_ids("abc, 5"), vec![5]);
        }
    }
}

/// Registration web app configuration
pub mod webapp {
    use once_cell::sync::Lazy;
    use std::env;

    /// Port the registration web server listens on
    pub static PORT: Lazy<u16> = Lazy::new(|| {
        env::var("WEBAPP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080)
    });

    /// Public base URL of the web app, used in Web App buttons
    pub static BASE_URL: Lazy<String> =
        Lazy::new(|| env::var("WEBAPP_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()));

    /// Whether POST /register must carry a valid Telegram initData signature
    pub static VALIDATE_INIT_DATA: Lazy<bool> = Lazy::new(|| {
        env::var("WEBAPP_VALIDATE_INIT_DATA")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    });

    /// URL of the registration form for a given user
    pub fn form_url(telegram_id: i64) -> String {
        format!("{}/?uid={}", BASE_URL.trim_end_matches('/'), telegram_id)
    }
}

/// Reminder scheduler configuration
pub mod reminder {
    use once_cell::sync::Lazy;
    use std::env;

    /// Days a user has to complete the profile before the check fires
    pub static GRACE_DAYS: Lazy<i64> = Lazy::new(|| {
        env::var("REMINDER_GRACE_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5)
    });

    /// Interval between sweep cycles over due checks (in seconds)
    pub static CHECK_INTERVAL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("REMINDER_CHECK_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600)
    });

    /// What to do with users whose profile is still incomplete when the check
    /// fires: "kick" removes them from the chat, "remind" sends a reminder
    /// and reschedules the check
    pub static POLICY: Lazy<String> =
        Lazy::new(|| env::var("REMINDER_POLICY").unwrap_or_else(|_| "kick".to_string()));
}

/// Broadcast configuration
pub mod broadcast {
    use super::Duration;

    /// Delay between sends to consecutive recipients (in milliseconds)
    pub const THROTTLE_MS: u64 = 50;

    /// How long to wait for the remaining parts of a media group before the
    /// collected album is broadcast
    pub const MEDIA_GROUP_WAIT_MS: u64 = 1000;

    /// Inter-send throttle duration
    pub fn throttle() -> Duration {
        Duration::from_millis(THROTTLE_MS)
    }

    /// Media group collection pause
    pub fn media_group_wait() -> Duration {
        Duration::from_millis(MEDIA_GROUP_WAIT_MS)
    }
}

/// Metrics configuration
pub mod metrics {
    use once_cell::sync::Lazy;
    use std::env;

    /// Whether the Prometheus endpoint is served at all
    pub static ENABLED: Lazy<bool> = Lazy::new(|| {
        env::var("METRICS_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    });

    /// Port for the metrics HTTP server
    pub static PORT: Lazy<u16> = Lazy::new(|| {
        env::var("METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9090)
    });
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API HTTP requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
