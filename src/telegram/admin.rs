//! Admin-only commands
//!
//! - `/setkpay`, `/setwave`: payment phone numbers in the settings store
//! - `/addcoin`: confirmed top-ups and corrections to a user's Coin balance

use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::prelude::*;

use crate::storage::ledger::keys;
use crate::storage::LedgerError;
use crate::telegram::handlers::{HandlerDeps, HandlerError};
use crate::telegram::menu::APOLOGY_TEXT;
use crate::telegram::notifications::notify_user_balance_changed;

const ADMIN_ONLY_TEXT: &str = "⛔ This command is for admins only.";

#[allow(clippy::unwrap_used)]
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{4,19}$").unwrap());

/// Which payment phone a command sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    KPay,
    Wave,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::KPay => "KPay",
            PaymentMethod::Wave => "Wave",
        }
    }

    pub fn setting_key(self) -> &'static str {
        match self {
            PaymentMethod::KPay => keys::KPAY_PHONE,
            PaymentMethod::Wave => keys::WAVE_PHONE,
        }
    }

    fn command(self) -> &'static str {
        match self {
            PaymentMethod::KPay => "/setkpay",
            PaymentMethod::Wave => "/setwave",
        }
    }
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Parses `<user_id> <amount>`; amount may be negative but not zero.
pub fn parse_addcoin_args(args: &str) -> Result<(i64, i64), &'static str> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 2 {
        return Err("Usage: /addcoin <user_id> <amount>");
    }
    let user_id = parts[0]
        .parse::<i64>()
        .map_err(|_| "❌ user_id must be a numeric Telegram id.")?;
    let amount = parts[1]
        .trim_start_matches('+')
        .parse::<i64>()
        .map_err(|_| "❌ amount must be a whole number, e.g. 500 or -100.")?;
    if amount == 0 {
        return Err("❌ amount must not be zero.");
    }
    Ok((user_id, amount))
}

/// Handles `/setkpay <phone>` and `/setwave <phone>`.
pub async fn handle_set_phone_command(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    method: PaymentMethod,
    args: &str,
) -> Result<(), HandlerError> {
    if !deps.is_admin(user_id) {
        log::warn!("User {} tried {} without admin rights", user_id, method.command());
        bot.send_message(chat_id, ADMIN_ONLY_TEXT).await?;
        return Ok(());
    }

    let phone = args.trim();
    if phone.is_empty() {
        bot.send_message(chat_id, format!("Usage: {} <phone>", method.command()))
            .await?;
        return Ok(());
    }
    if !is_valid_phone(phone) {
        bot.send_message(chat_id, format!("❌ '{}' does not look like a phone number.", phone))
            .await?;
        return Ok(());
    }

    match deps.ledger.set_setting(method.setting_key(), phone).await {
        Ok(()) => {
            bot.send_message(chat_id, format!("✅ {} phone set to {}", method.label(), phone))
                .await?;
        }
        Err(e) => {
            log::error!("Failed to store {} phone: {}", method.label(), e);
            bot.send_message(chat_id, APOLOGY_TEXT).await?;
        }
    }
    Ok(())
}

/// Handles `/addcoin <user_id> <amount>`.
pub async fn handle_addcoin_command(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    args: &str,
) -> Result<(), HandlerError> {
    if !deps.is_admin(user_id) {
        log::warn!("User {} tried /addcoin without admin rights", user_id);
        bot.send_message(chat_id, ADMIN_ONLY_TEXT).await?;
        return Ok(());
    }

    let (target, amount) = match parse_addcoin_args(args) {
        Ok(parsed) => parsed,
        Err(usage) => {
            bot.send_message(chat_id, usage).await?;
            return Ok(());
        }
    };

    let reply = match deps.ledger.adjust_balance(target, amount).await {
        Ok(balance) => {
            notify_user_balance_changed(bot, target, amount, balance).await;
            format!("✅ User {} balance: {} ({:+})", target, balance, amount)
        }
        Err(LedgerError::InsufficientBalance { current, .. }) => {
            format!("❌ User {} has only {} Coins; the balance cannot go negative.", target, current)
        }
        Err(LedgerError::UserNotFound(_)) => format!("❌ User {} is not registered.", target),
        Err(LedgerError::InvalidAmount(reason)) => format!("❌ Invalid amount: {}", reason),
        Err(e) => {
            log::error!("Failed to adjust balance of user {}: {}", target, e);
            APOLOGY_TEXT.to_string()
        }
    };
    bot.send_message(chat_id, reply).await?;
    Ok(())
}
