//! Command handler implementations (/start, /save, /balance, /help)

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;

use super::types::{ensure_user_exists, HandlerDeps, HandlerError, UserCreationResult, UserInfo};
use crate::telegram::bot::Command;
use crate::telegram::menu::{main_menu_keyboard, main_menu_text, APOLOGY_TEXT};

/// Registers the user if needed and sends the main menu.
///
/// Also reached from the `back_to_main` button. A ledger outage still shows
/// the menu, with the balance read failing open to 0.
pub(super) async fn handle_start_command(
    bot: &Bot,
    chat_id: ChatId,
    user: &UserInfo,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if ensure_user_exists(bot, deps, user).await == UserCreationResult::Created {
        log::info!("New user on /start: {}", user.describe());
    }

    let balance = deps.ledger.get_balance(user.user_id).await;
    bot.send_message(chat_id, main_menu_text(&user.first_name, balance))
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

const SAVE_USAGE_TEXT: &str = "Usage: /save something";
const NOTE_SAVED_TEXT: &str = "✅ Saved successfully!";

/// Handle /save <text>: stores the text as a note and registers the sender.
pub(super) async fn handle_save_command(
    bot: &Bot,
    chat_id: ChatId,
    user: &UserInfo,
    deps: &HandlerDeps,
    text: &str,
) -> Result<(), HandlerError> {
    let text = text.trim();
    if text.is_empty() {
        bot.send_message(chat_id, SAVE_USAGE_TEXT).await?;
        return Ok(());
    }

    ensure_user_exists(bot, deps, user).await;

    let reply = match deps.ledger.save_note(user.user_id, text).await {
        Ok(()) => NOTE_SAVED_TEXT,
        Err(e) => {
            log::error!("Failed to save note from user {}: {}", user.user_id, e);
            APOLOGY_TEXT
        }
    };
    bot.send_message(chat_id, reply).await?;
    Ok(())
}

/// Handle /balance
pub(super) async fn handle_balance_command(
    bot: &Bot,
    chat_id: ChatId,
    user: &UserInfo,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let text = match deps.ledger.get_user(user.user_id).await {
        Ok(Some(record)) => format!("🪙 Your Coin balance: {}", record.coin_balance),
        Ok(None) => "You are not registered yet. Send /start to open the shop.".to_string(),
        Err(e) => {
            log::error!("Failed to read user {}: {}", user.user_id, e);
            APOLOGY_TEXT.to_string()
        }
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

pub(super) async fn handle_help_command(bot: &Bot, chat_id: ChatId) -> Result<(), HandlerError> {
    bot.send_message(chat_id, Command::descriptions().to_string()).await?;
    Ok(())
}
