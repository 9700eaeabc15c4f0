//! meowpay - Telegram shop bot for Premium, Stars and Coins
//!
//! Users browse price lists, pay by KPay or Wave and send a screenshot;
//! the admin confirms and tops up their Coin balance.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors and logging
//! - `storage`: the user ledger and settings store (Google Sheets, Postgres or SQLite)
//! - `telegram`: bot setup, dispatcher schema and handlers

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use storage::{open_ledger, Ledger, LedgerError, UserRecord};
pub use telegram::{schema, HandlerDeps};
