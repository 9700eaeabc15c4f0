//! Messages sent to the administrator chat and balance notices to users

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;

use crate::telegram::handlers::UserInfo;

/// Sends a plain text message to the admin chat, logging failures.
pub async fn notify_admin_text(bot: &Bot, admin_chat_id: ChatId, text: &str) {
    if let Err(e) = bot.send_message(admin_chat_id, text).await {
        log::error!("Failed to send admin notification: {}", e);
    }
}

/// Announces a freshly registered user.
pub async fn notify_admin_new_user(bot: &Bot, admin_chat_id: ChatId, user: &UserInfo) {
    let text = format!("🆕 New user: {}", user.describe());
    notify_admin_text(bot, admin_chat_id, &text).await;
}

/// Tells the admin the bot is online.
pub async fn notify_admin_startup(bot: &Bot, admin_chat_id: ChatId, bot_username: Option<&str>, backend: &str) {
    let text = format!(
        "🤖 @{} is online (ledger: {})",
        bot_username.unwrap_or("bot"),
        backend
    );
    notify_admin_text(bot, admin_chat_id, &text).await;
}

/// Caption sent after a forwarded payment screenshot.
pub fn payment_proof_caption(user: &UserInfo, caption: Option<&str>) -> String {
    let mut text = format!(
        "🧾 <b>Payment proof</b>\nFrom: {}\nTop up with: <code>/addcoin {} &lt;amount&gt;</code>",
        html::escape(&user.describe()),
        user.user_id
    );
    if let Some(caption) = caption.filter(|c| !c.trim().is_empty()) {
        text.push_str(&format!("\nNote: {}", html::escape(caption)));
    }
    text
}

/// Forwards the screenshot message to the admin chat followed by who sent it.
///
/// Returns the first Telegram error; the user-facing reply depends on it.
pub async fn relay_payment_proof(
    bot: &Bot,
    admin_chat_id: ChatId,
    msg: &Message,
    user: &UserInfo,
) -> ResponseResult<()> {
    bot.forward_message(admin_chat_id, msg.chat.id, msg.id).await?;
    bot.send_message(admin_chat_id, payment_proof_caption(user, msg.caption()))
        .parse_mode(ParseMode::Html)
        .await?;
    log::info!("Relayed payment proof from user {} to admin chat", user.user_id);
    Ok(())
}

/// Lets a user know their balance changed after an admin top-up.
pub async fn notify_user_balance_changed(bot: &Bot, user_id: i64, delta: i64, balance: i64) {
    let text = if delta >= 0 {
        format!("🪙 {} Coins were added to your balance. New balance: {}", delta, balance)
    } else {
        format!("🪙 {} Coins were deducted from your balance. New balance: {}", -delta, balance)
    };
    if let Err(e) = bot.send_message(ChatId(user_id), text).await {
        log::warn!("Failed to notify user {} about balance change: {}", user_id, e);
    }
}
