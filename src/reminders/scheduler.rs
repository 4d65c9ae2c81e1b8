//! Background sweep over due profile checks.
//!
//! Runs as a `tokio::spawn`ed task owning its own `Bot` and pool handles.
//! Each cycle loads the due rows and applies the policy per user; Telegram
//! errors are logged and never abort the rest of the cycle.

use chrono::Utc;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, ParseMode};
use tokio::time::{interval, Duration};

use crate::core::{config, metrics};
use crate::reminders::db;
use crate::storage::db::DbPool;
use crate::storage::get_connection;
use crate::telegram::texts;

/// What happens to a user whose profile is still incomplete when the check
/// fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderPolicy {
    /// Remove the user from the community chat and DM a re-entry link
    Kick,
    /// DM a reminder and schedule the next check another grace period out
    Remind,
}

impl ReminderPolicy {
    /// Policy from REMINDER_POLICY; anything other than "remind" means kick.
    pub fn from_config() -> Self {
        match config::reminder::POLICY.as_str() {
            "remind" => Self::Remind,
            _ => Self::Kick,
        }
    }
}

/// Start the reminder sweep background task.
pub fn start_reminder_scheduler(
    bot: Bot,
    db_pool: Arc<DbPool>,
    chat_id: ChatId,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let policy = ReminderPolicy::from_config();
        let grace = chrono::Duration::days(*config::reminder::GRACE_DAYS);
        let mut ticker = interval(Duration::from_secs(*config::reminder::CHECK_INTERVAL_SECS));

        log::info!(
            "Reminder scheduler started (interval: {}s, policy: {:?}, grace: {} day(s))",
            *config::reminder::CHECK_INTERVAL_SECS,
            policy,
            *config::reminder::GRACE_DAYS,
        );

        loop {
            ticker.tick().await;

            if let Err(e) = run_check_cycle(&bot, &db_pool, chat_id, policy, grace).await {
                log::error!("Reminder check cycle failed: {}", e);
            }
        }
    })
}

/// Run one sweep: load due checks, handle each one.
pub async fn run_check_cycle(
    bot: &Bot,
    db_pool: &Arc<DbPool>,
    chat_id: ChatId,
    policy: ReminderPolicy,
    grace: chrono::Duration,
) -> anyhow::Result<()> {
    let due = {
        let conn = get_connection(db_pool)?;
        db::due_checks(&conn, Utc::now())?
    };

    if due.is_empty() {
        return Ok(());
    }

    log::info!("Reminder cycle: {} due check(s)", due.len());

    for check in &due {
        if let Err(e) =
            process_due_check(bot, db_pool, chat_id, policy, grace, check.telegram_id).await
        {
            log::warn!(
                "Reminder check failed for user {}: {}",
                check.telegram_id,
                e
            );
        }
    }

    Ok(())
}

/// Handle a single due check for one user.
async fn process_due_check(
    bot: &Bot,
    db_pool: &Arc<DbPool>,
    chat_id: ChatId,
    policy: ReminderPolicy,
    grace: chrono::Duration,
    telegram_id: i64,
) -> anyhow::Result<()> {
    let user = {
        let conn = get_connection(db_pool)?;
        crate::storage::db::get_user(&conn, telegram_id)?
    };

    let complete = user.as_ref().map(|u| u.is_complete()).unwrap_or(false);
    if user.is_none() || complete {
        let conn = get_connection(db_pool)?;
        db::clear_check(&conn, telegram_id)?;
        return Ok(());
    }

    match policy {
        ReminderPolicy::Kick => {
            kick_unregistered(bot, chat_id, telegram_id).await;
            let conn = get_connection(db_pool)?;
            db::clear_check(&conn, telegram_id)?;
        }
        ReminderPolicy::Remind => {
            remind_unregistered(bot, telegram_id).await;
            let conn = get_connection(db_pool)?;
            db::schedule_check(&conn, telegram_id, Utc::now() + grace)?;
        }
    }

    Ok(())
}

/// Remove a still-unregistered user from the chat and DM a re-entry link.
///
/// Ban followed by unban so the freshly issued invite works again after the
/// form is completed. Every Telegram failure is logged and swallowed.
async fn kick_unregistered(bot: &Bot, chat_id: ChatId, telegram_id: i64) {
    let Ok(raw_id) = u64::try_from(telegram_id) else {
        log::warn!("Skipping kick for invalid telegram id {}", telegram_id);
        return;
    };
    let user_id = UserId(raw_id);

    match bot.get_chat_member(chat_id, user_id).await {
        Ok(member) if matches!(member.kind, ChatMemberKind::Left | ChatMemberKind::Banned(_)) => {
            log::info!("User {} already left the chat, nothing to do", telegram_id);
            return;
        }
        Ok(_) => {}
        Err(e) => {
            log::warn!("Failed to check membership for {}: {}", telegram_id, e);
            return;
        }
    }

    if let Err(e) = bot.ban_chat_member(chat_id, user_id).await {
        log::warn!("Failed to kick user {}: {}", telegram_id, e);
        return;
    }
    if let Err(e) = bot.unban_chat_member(chat_id, user_id).await {
        log::warn!("Failed to lift the ban for {}: {}", telegram_id, e);
    }

    metrics::KICKS_TOTAL.inc();
    log::info!("Removed user {} from the chat (profile incomplete)", telegram_id);

    let kb = texts::webapp_form_keyboard(telegram_id, texts::FILL_PROFILE_BUTTON);
    if let Err(e) = bot
        .send_message(ChatId(telegram_id), texts::KICKED_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(kb)
        .await
    {
        // Личка может быть закрыта, это не ошибка цикла
        log::warn!("Failed to DM kicked user {}: {}", telegram_id, e);
    }
}

/// DM a reminder with the form button.
async fn remind_unregistered(bot: &Bot, telegram_id: i64) {
    let kb = texts::webapp_form_keyboard(telegram_id, texts::FILL_PROFILE_BUTTON);
    match bot
        .send_message(ChatId(telegram_id), texts::REMINDER_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(kb)
        .await
    {
        Ok(_) => {
            metrics::REMINDERS_SENT_TOTAL.inc();
        }
        Err(e) => {
            log::warn!("Failed to remind user {}: {}", telegram_id, e);
        }
    }
}
