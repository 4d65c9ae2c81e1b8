//! Best-effort admin notifications
//!
//! Everything here is fire-and-forget: a failed notification is logged and
//! never propagated to the calling handler.

use teloxide::prelude::*;

use crate::core::config::admin::ADMIN_USER_ID;

fn admin_chat_id() -> Option<ChatId> {
    let admin_id = *ADMIN_USER_ID;
    (admin_id != 0).then_some(ChatId(admin_id))
}

/// Notify the admin that the bot (re)started.
pub async fn notify_admin_startup(bot: &Bot, bot_username: Option<&str>) {
    let Some(chat_id) = admin_chat_id() else {
        return;
    };

    let text = format!(
        "🤖 Бот @{} запущен и принимает обновления.",
        bot_username.unwrap_or("reclin_bot")
    );

    if let Err(e) = bot.send_message(chat_id, text).await {
        log::warn!("Failed to send startup notification: {}", e);
    }
}

/// Notify the admin about a first-time /start.
pub async fn notify_admin_new_user(bot: &Bot, telegram_id: i64, username: Option<&str>) {
    let Some(chat_id) = admin_chat_id() else {
        return;
    };

    let text = match username {
        Some(username) => format!("👤 Новый пользователь: @{} (id {})", username, telegram_id),
        None => format!("👤 Новый пользователь: id {}", telegram_id),
    };

    if let Err(e) = bot.send_message(chat_id, text).await {
        log::warn!("Failed to send new-user notification: {}", e);
    }
}

/// Notify the admin about a completed registration form.
pub async fn notify_admin_registration(bot: &Bot, telegram_id: i64, fio: &str) {
    let Some(chat_id) = admin_chat_id() else {
        return;
    };

    let text = format!("📝 Анкета заполнена: {} (id {})", fio, telegram_id);

    if let Err(e) = bot.send_message(chat_id, text).await {
        log::warn!("Failed to send registration notification: {}", e);
    }
}
