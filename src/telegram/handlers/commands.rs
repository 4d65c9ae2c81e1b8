//! Command handler implementations (/start)

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use super::types::{HandlerDeps, HandlerError};
use crate::core::{config, metrics};
use crate::reminders;
use crate::storage::db;
use crate::storage::get_connection;
use crate::telegram::invite::create_one_time_invite;
use crate::telegram::notifications::notify_admin_new_user;
use crate::telegram::texts;

/// Handle /start: welcome the user, issue an invite, create the stub row and
/// schedule the profile check.
pub(super) async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let telegram_id = msg
        .from
        .as_ref()
        .and_then(|u| i64::try_from(u.id.0).ok())
        .unwrap_or(msg.chat.id.0);
    let username = msg.from.as_ref().and_then(|u| u.username.clone());

    // Best effort: the stub still gets created when the bot cannot mint the
    // link (e.g. it is not an admin of the chat yet), the form issues a
    // fresh one anyway
    let invite_link = match create_one_time_invite(bot, ChatId(*config::COMMUNITY_CHAT_ID)).await {
        Ok(link) => link,
        Err(e) => {
            log::warn!("Failed to create invite link for {}: {}", telegram_id, e);
            String::new()
        }
    };

    let is_new_user = {
        let conn = get_connection(&deps.db_pool)?;
        let existed = db::get_user(&conn, telegram_id)?.is_some();
        db::upsert_stub(&conn, telegram_id, username.as_deref(), &invite_link)?;
        reminders::db::schedule_check(
            &conn,
            telegram_id,
            Utc::now() + chrono::Duration::days(*config::reminder::GRACE_DAYS),
        )?;
        !existed
    };

    metrics::STARTS_TOTAL.inc();

    if is_new_user {
        log::info!("New user on /start: telegram_id={}", telegram_id);
        let bot_notify = bot.clone();
        let username_notify = username.clone();
        tokio::spawn(async move {
            notify_admin_new_user(&bot_notify, telegram_id, username_notify.as_deref()).await;
        });
    }

    bot.send_message(msg.chat.id, texts::WELCOME_TEXT)
        .parse_mode(ParseMode::Html)
        .await?;

    bot.send_message(msg.chat.id, texts::STARTER_PACK_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(texts::webapp_form_keyboard(telegram_id, texts::CONNECT_BUTTON))
        .await?;

    Ok(())
}
