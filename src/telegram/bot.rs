//! Bot initialization and the command set

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "приветствие и подключение к сообществу")]
    Start,
    #[command(description = "рассылка сообщения всем пользователям (только для администраторов)")]
    Broadcast,
    #[command(description = "выгрузка списка участников в Excel (только для администраторов)")]
    Export,
    #[command(description = "статистика по участникам (только для администраторов)")]
    Info,
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to create bot (invalid URL, client build)
pub fn create_bot() -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;

    let bot = if let Ok(bot_api_url) = std::env::var("BOT_API_URL") {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(&bot_api_url)
            .map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        Bot::from_env_with_client(client).set_api_url(url)
    } else {
        Bot::from_env_with_client(client)
    };

    Ok(bot)
}

/// Sets up bot commands in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![
        BotCommand::new("start", "приветствие и подключение к сообществу"),
        BotCommand::new("broadcast", "рассылка (только для администраторов)"),
        BotCommand::new("export", "выгрузка участников (только для администраторов)"),
        BotCommand::new("info", "статистика (только для администраторов)"),
    ])
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_descriptions() {
        let commands = Command::descriptions();
        let command_list = format!("{}", commands);

        assert!(command_list.contains("Я умею"));
        assert!(command_list.contains("start"));
        assert!(command_list.contains("broadcast"));
        assert!(command_list.contains("export"));
        assert!(command_list.contains("info"));
    }

    #[test]
    fn test_command_parsing() {
        assert!(matches!(
            Command::parse("/start", "reclin_bot"),
            Ok(Command::Start)
        ));
        assert!(matches!(
            Command::parse("/broadcast", "reclin_bot"),
            Ok(Command::Broadcast)
        ));
        assert!(Command::parse("/unknown", "reclin_bot").is_err());
    }
}
