//! Admin functionality for the bot
//!
//! This module contains the admin-only commands and the broadcast
//! conversation:
//! - /broadcast: prompt → collect the next message → fan out
//! - /export: users table as an .xlsx document
//! - /info: membership counts

use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message,
};

use crate::core::config::admin::{ADMIN_IDS, ADMIN_USER_ID};
use crate::core::export::export_users_to_xlsx;
use crate::reminders;
use crate::storage::db::{self, DbPool};
use crate::storage::get_connection;
use crate::telegram::broadcast::{self, AlbumPart, BroadcastContent, PendingBroadcast};
use crate::telegram::handlers::{HandlerDeps, HandlerError};
use crate::telegram::texts;

/// Check if user is admin
pub fn is_admin(user_id: i64) -> bool {
    if !ADMIN_IDS.is_empty() {
        return ADMIN_IDS.contains(&user_id);
    }
    if *ADMIN_USER_ID != 0 {
        return *ADMIN_USER_ID == user_id;
    }
    false
}

/// Sender id of a message, 0 when there is no sender
fn sender_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .and_then(|u| i64::try_from(u.id.0).ok())
        .unwrap_or(0)
}

/// Handle /broadcast: mark the chat as awaiting broadcast content.
///
/// Non-admins are ignored silently, same as the rest of the admin commands.
pub async fn handle_broadcast_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if !is_admin(sender_id(msg)) {
        return Ok(());
    }

    deps.pending_broadcasts
        .insert(msg.chat.id.0, PendingBroadcast::default());

    let kb = InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        texts::BROADCAST_CANCEL_BUTTON,
        texts::BROADCAST_CANCEL_CALLBACK,
    )]]);

    bot.send_message(msg.chat.id, texts::BROADCAST_PROMPT)
        .reply_markup(kb)
        .await?;

    Ok(())
}

/// Handle the message that follows /broadcast in an awaiting admin chat.
///
/// Single messages are broadcast immediately. Media-group parts are buffered;
/// the first part arms a delayed flush so the rest of the album can arrive.
pub async fn handle_broadcast_collect(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if !is_admin(sender_id(msg)) {
        return Ok(());
    }

    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

    if msg.media_group_id().is_some() {
        let Some(part) = AlbumPart::from_message(msg) else {
            return Ok(());
        };

        let first_part = {
            let mut pending = deps
                .pending_broadcasts
                .entry(msg.chat.id.0)
                .or_default();
            pending.album.push(part);
            pending.album.len() == 1
        };

        if first_part {
            let bot = bot.clone();
            let deps = deps.clone();
            let chat_id = msg.chat.id;
            tokio::spawn(async move {
                tokio::time::sleep(crate::core::config::broadcast::media_group_wait()).await;
                if let Err(e) = flush_album_broadcast(&bot, chat_id, &deps).await {
                    log::error!("Album broadcast failed in chat {}: {}", chat_id, e);
                }
            });
        }

        return Ok(());
    }

    deps.pending_broadcasts.remove(&msg.chat.id.0);
    let content = BroadcastContent::from_message(msg);
    run_broadcast_and_report(bot, msg.chat.id, &deps.db_pool, &content).await
}

/// Sends the buffered album once the collection pause elapsed.
async fn flush_album_broadcast(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    // The admin may have cancelled while the album was arriving
    let Some((_, pending)) = deps.pending_broadcasts.remove(&chat_id.0) else {
        return Ok(());
    };

    let content = pending.into_content();
    run_broadcast_and_report(bot, chat_id, &deps.db_pool, &content).await
}

async fn run_broadcast_and_report(
    bot: &Bot,
    admin_chat_id: ChatId,
    db_pool: &DbPool,
    content: &BroadcastContent,
) -> Result<(), HandlerError> {
    let tg_ids = {
        let conn = get_connection(db_pool)?;
        db::get_all_user_ids(&conn)?
    };

    let (sent, failed) = broadcast::send_broadcast(bot, &tg_ids, content).await;

    bot.send_message(admin_chat_id, texts::broadcast_report(sent, failed))
        .await?;

    Ok(())
}

/// Handle the broadcast cancel button.
pub async fn handle_broadcast_cancel(
    bot: &Bot,
    query: &CallbackQuery,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if let Some(msg) = query.message.as_ref() {
        deps.pending_broadcasts.remove(&msg.chat().id.0);
        let _ = bot
            .edit_message_text(msg.chat().id, msg.id(), texts::BROADCAST_CANCELLED)
            .await;
    }

    bot.answer_callback_query(query.id.clone()).await?;

    Ok(())
}

/// Handle /export: dump the users table to an .xlsx document.
pub async fn handle_export_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if !is_admin(sender_id(msg)) {
        return Ok(());
    }

    let users = {
        let conn = get_connection(&deps.db_pool)?;
        db::get_all_users(&conn)?
    };

    let workbook = export_users_to_xlsx(&users)?;

    bot.send_document(
        msg.chat.id,
        InputFile::memory(workbook).file_name("users.xlsx"),
    )
    .await?;

    Ok(())
}

/// Handle /info: membership counts summary.
pub async fn handle_info_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if !is_admin(sender_id(msg)) {
        return Ok(());
    }

    let (total, complete, pending_checks) = {
        let conn = get_connection(&deps.db_pool)?;
        (
            db::count_users(&conn)?,
            db::count_complete(&conn)?,
            reminders::db::count_pending(&conn)?,
        )
    };

    bot.send_message(msg.chat.id, texts::info_report(total, complete, pending_checks))
        .await?;

    Ok(())
}
