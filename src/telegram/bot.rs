//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command parsing that honours `/cmd@botname` addressing

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "open the shop menu")]
    Start,
    #[command(description = "save a note for the shop admins")]
    Save(String),
    #[command(description = "show your Coin balance")]
    Balance,
    #[command(description = "show this help")]
    Help,
    #[command(description = "set the KPay phone number (admin only)")]
    Setkpay(String),
    #[command(description = "set the Wave phone number (admin only)")]
    Setwave(String),
    #[command(description = "add or remove Coins: /addcoin <user_id> <amount> (admin only)")]
    Addcoin(String),
}

impl Command {
    /// Parses a message text as a command.
    ///
    /// `bot_username` is compared against `/cmd@name`; commands addressed
    /// to another bot do not parse.
    pub fn from_text(text: &str, bot_username: Option<&str>) -> Option<Self> {
        Self::parse(text, bot_username.unwrap_or_default()).ok()
    }
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Invalid BOT_API_URL or HTTP client setup failure
pub fn create_bot() -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(config::BOT_TOKEN.as_str(), client);

    let bot = if let Ok(bot_api_url) = std::env::var("BOT_API_URL") {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        bot.set_api_url(url)
    } else {
        bot
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
