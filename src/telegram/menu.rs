//! Shop menus: callback tokens, inline keyboards and price texts

use indoc::{formatdoc, indoc};
use strum::{AsRefStr, EnumString};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

/// Callback data carried by the inline buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MenuAction {
    PremiumPrices,
    StarPrices,
    CoinPrices,
    PayKpay,
    PayWave,
    BackToMain,
}

impl MenuAction {
    pub fn parse(data: &str) -> Option<Self> {
        data.parse().ok()
    }

    pub fn button(self, text: &str) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(text, self.as_ref())
    }
}

/// Telegram Premium packages: (duration, price in MMK)
pub const PREMIUM_PRICES: &[(&str, u32)] = &[
    ("1 Month", 25_000),
    ("3 Months", 55_000),
    ("6 Months", 75_000),
    ("12 Months", 130_000),
];

/// Telegram Stars packages: (stars, price in MMK)
pub const STAR_PRICES: &[(u32, u32)] = &[(50, 5_000), (100, 9_500), (500, 45_000), (1000, 88_000)];

/// Coin top-up packages: (coins, price in MMK)
pub const COIN_PACKAGES: &[(u32, u32)] = &[(100, 1_000), (550, 5_000), (1200, 10_000), (6500, 50_000)];

/// `1234567` -> `1,234,567`
pub fn format_amount(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn main_menu_text(first_name: &str, balance: i64) -> String {
    formatdoc! {"
        👋 Hello, <b>{name}</b>!

        Welcome to the Meow Premium shop. Pick what you want to buy:
        ⭐ Telegram Premium
        🌟 Telegram Stars
        🪙 Coins

        Your Coin balance: <b>{balance}</b>",
        name = html::escape(first_name),
        balance = balance,
    }
}

pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![MenuAction::PremiumPrices.button("⭐ Premium prices")],
        vec![MenuAction::StarPrices.button("🌟 Star prices")],
        vec![MenuAction::CoinPrices.button("🪙 Coin packages")],
        vec![
            MenuAction::PayKpay.button("💳 Pay with KPay"),
            MenuAction::PayWave.button("💳 Pay with Wave"),
        ],
    ])
}

/// Keyboard under a price list: payment methods and back.
pub fn prices_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            MenuAction::PayKpay.button("💳 KPay"),
            MenuAction::PayWave.button("💳 Wave"),
        ],
        vec![MenuAction::BackToMain.button("⬅️ Back")],
    ])
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![MenuAction::BackToMain.button("⬅️ Back")]])
}

pub fn premium_prices_text() -> String {
    let mut text = String::from("⭐ <b>Telegram Premium</b>\n\n");
    for (period, price) in PREMIUM_PRICES {
        text.push_str(&format!("• {} — {} MMK\n", period, format_amount(*price)));
    }
    text.push_str("\nPremium is gifted to your account; send your @username with the payment.");
    text
}

pub fn star_prices_text() -> String {
    let mut text = String::from("🌟 <b>Telegram Stars</b>\n\n");
    for (stars, price) in STAR_PRICES {
        text.push_str(&format!(
            "• {} Stars — {} MMK\n",
            format_amount(*stars),
            format_amount(*price)
        ));
    }
    text
}

pub fn coin_prices_text() -> String {
    let mut text = String::from("🪙 <b>Coins</b>\n\n");
    for (coins, price) in COIN_PACKAGES {
        text.push_str(&format!(
            "• {} Coins — {} MMK\n",
            format_amount(*coins),
            format_amount(*price)
        ));
    }
    text.push_str("\nCoins are added to your balance once the admin confirms your payment.");
    text
}

/// Payment instructions for one method; `phone` is already resolved to a display value.
pub fn payment_text(method: &str, phone: &str) -> String {
    formatdoc! {"
        💳 <b>Pay with {method}</b>

        Phone: <code>{phone}</code>

        After paying, send a screenshot of the receipt here.
        The admin will check it and confirm your order.",
        method = method,
        phone = html::escape(phone),
    }
}

pub const NOT_UNDERSTOOD_TEXT: &str = "🤔 Sorry, I didn't understand that. Send /start to open the menu.";

pub const APOLOGY_TEXT: &str = "😿 Something went wrong on our side. Please try again in a moment.";

pub const PROOF_RECEIVED_TEXT: &str = indoc! {"
    ✅ Screenshot received!
    The admin will verify your payment and get back to you soon."};
