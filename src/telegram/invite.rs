//! One-time invite links for the community chat

use teloxide::prelude::*;
use teloxide::RequestError;

/// Mints a fresh single-use invite link for the community chat.
///
/// `member_limit(1)` makes the link die after the first join, so every user
/// gets their own.
pub async fn create_one_time_invite(bot: &Bot, chat_id: ChatId) -> Result<String, RequestError> {
    let link = bot.create_chat_invite_link(chat_id).member_limit(1).await?;
    Ok(link.invite_link)
}
