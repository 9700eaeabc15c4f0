//! Inline button callbacks: price lists, payment details and navigation

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};

use super::commands::handle_start_command;
use super::types::{HandlerDeps, HandlerError, UserInfo};
use crate::storage::ledger::keys;
use crate::telegram::menu::{
    back_keyboard, coin_prices_text, payment_text, premium_prices_text, prices_keyboard, star_prices_text, MenuAction,
};

const UNKNOWN_BUTTON_TEXT: &str = "This button is no longer supported. Send /start.";

/// Routes a callback query by its data token.
pub(super) async fn handle_menu_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let data = q.data.as_deref().unwrap_or_default();
    let Some(action) = MenuAction::parse(data) else {
        log::warn!("Unknown callback data '{}' from user {}", data, q.from.id);
        bot.answer_callback_query(q.id.clone()).text(UNKNOWN_BUTTON_TEXT).await?;
        return Ok(());
    };

    bot.answer_callback_query(q.id.clone()).await?;

    let user = UserInfo::from_user(&q.from);
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user.user_id));

    let (text, keyboard) = match action {
        MenuAction::BackToMain => return handle_start_command(bot, chat_id, &user, deps).await,
        MenuAction::PremiumPrices => (premium_prices_text(), prices_keyboard()),
        MenuAction::StarPrices => (star_prices_text(), prices_keyboard()),
        MenuAction::CoinPrices => (coin_prices_text(), prices_keyboard()),
        MenuAction::PayKpay => {
            let phone = deps.ledger.display_setting(keys::KPAY_PHONE).await;
            (payment_text("KPay", &phone), back_keyboard())
        }
        MenuAction::PayWave => {
            let phone = deps.ledger.display_setting(keys::WAVE_PHONE).await;
            (payment_text("Wave", &phone), back_keyboard())
        }
    };

    show_screen(bot, q, chat_id, text, keyboard).await
}

/// Edits the message carrying the button; sends a new one when it can't be edited.
async fn show_screen(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> Result<(), HandlerError> {
    if let Some(message) = q.regular_message() {
        let edited = bot
            .edit_message_text(chat_id, message.id, text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await;
        match edited {
            Ok(_) => return Ok(()),
            Err(e) => log::warn!("Failed to edit menu message in chat {}: {}", chat_id, e),
        }
    }

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}
