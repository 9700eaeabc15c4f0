//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::callbacks::handle_menu_callback;
use super::commands::{handle_balance_command, handle_help_command, handle_save_command, handle_start_command};
use super::payments::handle_payment_photo;
use super::types::{HandlerDeps, HandlerError, UserInfo};
use crate::telegram::admin::{handle_addcoin_command, handle_set_phone_command, PaymentMethod};
use crate::telegram::bot::Command;
use crate::telegram::menu::NOT_UNDERSTOOD_TEXT;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same tree runs in production and in the integration tests, which
/// dispatch updates through it with only `Bot` and `Update` injected.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_photos = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(photo_handler(deps_photos))
        .branch(fallback_handler())
        .branch(callback_handler(deps_callback))
}

/// Parses the message text as one of our commands.
///
/// Uses `deps.bot_username` instead of `filter_command`; the schema only
/// needs `Bot` and `Update` injected.
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let bot_username = deps.bot_username.clone();

    Update::filter_message()
        .filter_map(move |msg: Message| {
            msg.text()
                .and_then(|text| Command::from_text(text, bot_username.as_deref()))
        })
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);
                let user = UserInfo::from_message(&msg);
                let chat_id = msg.chat.id;

                match cmd {
                    Command::Start => handle_start_command(&bot, chat_id, &user, &deps).await?,
                    Command::Save(text) => handle_save_command(&bot, chat_id, &user, &deps, &text).await?,
                    Command::Balance => handle_balance_command(&bot, chat_id, &user, &deps).await?,
                    Command::Help => handle_help_command(&bot, chat_id).await?,
                    Command::Setkpay(args) => {
                        handle_set_phone_command(&bot, &deps, chat_id, user.user_id, PaymentMethod::KPay, &args).await?
                    }
                    Command::Setwave(args) => {
                        handle_set_phone_command(&bot, &deps, chat_id, user.user_id, PaymentMethod::Wave, &args).await?
                    }
                    Command::Addcoin(args) => handle_addcoin_command(&bot, &deps, chat_id, user.user_id, &args).await?,
                }
                Ok(())
            }
        })
}

/// Photos are payment proof.
fn photo_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.photo().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_payment_photo(&bot, &msg, &deps).await }
        })
}

/// Any other text, including unknown commands.
fn fallback_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(|bot: Bot, msg: Message| async move {
            bot.send_message(msg.chat.id, NOT_UNDERSTOOD_TEXT).await?;
            Ok(())
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move { handle_menu_callback(&bot, &q, &deps).await }
    })
}
