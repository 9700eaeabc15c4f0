//! Payment screenshots sent by users

use teloxide::prelude::*;

use super::types::{HandlerDeps, HandlerError, UserInfo};
use crate::telegram::menu::{APOLOGY_TEXT, PROOF_RECEIVED_TEXT};
use crate::telegram::notifications::relay_payment_proof;

/// Forwards a photo to the admin chat and acknowledges it to the sender.
pub(super) async fn handle_payment_photo(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let user = UserInfo::from_message(msg);
    log::info!("Payment screenshot from {}", user.describe());

    let reply = match relay_payment_proof(bot, deps.admin_chat_id, msg, &user).await {
        Ok(()) => PROOF_RECEIVED_TEXT,
        Err(e) => {
            log::error!("Failed to relay payment proof from user {}: {}", user.user_id, e);
            APOLOGY_TEXT
        }
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
