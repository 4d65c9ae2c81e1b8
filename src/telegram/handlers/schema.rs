//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Message};

use super::commands::handle_start_command;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::admin;
use crate::telegram::bot::Command;
use crate::telegram::texts;

/// Creates the main dispatcher schema for the bot.
///
/// The same schema is used in production and in integration tests. Command
/// handling comes first so that /export or a repeated /broadcast from an
/// awaiting admin chat is never swallowed as broadcast content.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_collect = deps.clone();
    let deps_cancel = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(broadcast_collect_handler(deps_collect))
        .branch(broadcast_cancel_handler(deps_cancel))
}

/// Handler for bot commands (/start, /broadcast, /export, /info)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let result = match cmd {
                    Command::Start => handle_start_command(&bot, &msg, &deps).await,
                    Command::Broadcast => admin::handle_broadcast_command(&bot, &msg, &deps).await,
                    Command::Export => admin::handle_export_command(&bot, &msg, &deps).await,
                    Command::Info => admin::handle_info_command(&bot, &msg, &deps).await,
                };

                if let Err(e) = result {
                    log::error!("Command handler failed in chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

/// Handler for the message that follows /broadcast in an awaiting admin chat
fn broadcast_collect_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let filter_deps = deps.clone();

    Update::filter_message()
        .filter(move |msg: Message| filter_deps.pending_broadcasts.contains_key(&msg.chat.id.0))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = admin::handle_broadcast_collect(&bot, &msg, &deps).await {
                    log::error!("Broadcast collection failed in chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

/// Handler for the broadcast cancel button
fn broadcast_cancel_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query()
        .filter(|query: CallbackQuery| {
            query.data.as_deref() == Some(texts::BROADCAST_CANCEL_CALLBACK)
        })
        .endpoint(move |bot: Bot, query: CallbackQuery| {
            let deps = deps.clone();
            async move {
                if let Err(e) = admin::handle_broadcast_cancel(&bot, &query, &deps).await {
                    log::error!("Broadcast cancel failed: {}", e);
                }
                Ok(())
            }
        })
}
