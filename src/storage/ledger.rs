//! User ledger and settings store
//!
//! [`Ledger`] is the handle handlers receive. It wraps one [`LedgerBackend`]
//! (spreadsheet, Postgres or SQLite) and applies the fail-open/fail-closed
//! policy: reads that hit a backend error are logged and degrade to a zero
//! balance or a fallback display value, writes return the error so the
//! caller can apologise to the user.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Timestamp format used for `joined_at` in text-backed stores.
pub const JOINED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Known keys in the settings store.
pub mod keys {
    pub const KPAY_PHONE: &str = "kpay_phone";
    pub const WAVE_PHONE: &str = "wave_phone";
}

/// Display value for a missing payment phone number.
pub const UNKNOWN: &str = "Unknown";
/// Display value for any other missing setting.
pub const NOT_AVAILABLE: &str = "N/A";

/// Fallback display text for a settings key with no stored value.
pub fn fallback_for(key: &str) -> &'static str {
    match key {
        keys::KPAY_PHONE | keys::WAVE_PHONE => UNKNOWN,
        _ => NOT_AVAILABLE,
    }
}

/// One row of the user ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    /// UTC, formatted with [`JOINED_AT_FORMAT`]
    pub joined_at: String,
    /// Never negative once stored
    pub coin_balance: i64,
}

impl UserRecord {
    /// A fresh record with zero balance, joined now.
    pub fn new(user_id: i64, username: Option<String>, first_name: impl Into<String>) -> Self {
        Self {
            user_id,
            username,
            first_name: first_name.into(),
            joined_at: chrono::Utc::now().format(JOINED_AT_FORMAT).to_string(),
            coin_balance: 0,
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("user {0} is not registered")]
    UserNotFound(i64),

    #[error("insufficient balance for user {user_id}: current {current}, change {delta}")]
    InsufficientBalance { user_id: i64, current: i64, delta: i64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Sheets API returned {status}: {body}")]
    SheetsStatus { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Google auth error: {0}")]
    GoogleAuth(#[from] gcp_auth::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("malformed ledger data: {0}")]
    Malformed(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Computes `current + delta`, refusing overflow and negative results.
pub(crate) fn apply_delta(user_id: i64, current: i64, delta: i64) -> LedgerResult<i64> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| LedgerError::InvalidAmount(format!("{} + {} overflows", current, delta)))?;
    if next < 0 {
        return Err(LedgerError::InsufficientBalance { user_id, current, delta });
    }
    Ok(next)
}

/// Storage operations each backend provides.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Creates tables or header rows if they are missing.
    async fn init(&self) -> LedgerResult<()>;

    async fn find_user(&self, user_id: i64) -> LedgerResult<Option<UserRecord>>;

    /// Inserts the record unless a row with the same id exists.
    /// Returns `true` when a row was created.
    async fn insert_user_if_absent(&self, record: &UserRecord) -> LedgerResult<bool>;

    /// Adds `delta` to the stored balance and returns the new balance.
    /// A result below zero is rejected and nothing is written.
    async fn adjust_balance(&self, user_id: i64, delta: i64) -> LedgerResult<i64>;

    async fn get_setting(&self, key: &str) -> LedgerResult<Option<String>>;

    async fn set_setting(&self, key: &str, value: &str) -> LedgerResult<()>;

    /// Appends a free-form note from `/save`, kept apart from the user rows.
    async fn append_note(&self, user_id: i64, text: &str, saved_at: &str) -> LedgerResult<()>;
}

/// Cloneable handle to the configured ledger backend.
#[derive(Clone)]
pub struct Ledger {
    backend: Arc<dyn LedgerBackend>,
}

impl Ledger {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn init(&self) -> LedgerResult<()> {
        self.backend.init().await
    }

    /// Registers the user if this id has never been seen.
    pub async fn save_new_user(&self, record: &UserRecord) -> LedgerResult<bool> {
        let created = self.backend.insert_user_if_absent(record).await?;
        if created {
            log::info!(
                "Registered user {} (@{}) in {} ledger",
                record.user_id,
                record.username.as_deref().unwrap_or("-"),
                self.backend.name()
            );
        }
        Ok(created)
    }

    pub async fn get_user(&self, user_id: i64) -> LedgerResult<Option<UserRecord>> {
        self.backend.find_user(user_id).await
    }

    /// Current balance; 0 for unknown users and on backend errors.
    pub async fn get_balance(&self, user_id: i64) -> i64 {
        match self.backend.find_user(user_id).await {
            Ok(Some(user)) => user.coin_balance,
            Ok(None) => 0,
            Err(e) => {
                log::error!("Failed to read balance for user {}: {}", user_id, e);
                0
            }
        }
    }

    pub async fn adjust_balance(&self, user_id: i64, delta: i64) -> LedgerResult<i64> {
        let balance = self.backend.adjust_balance(user_id, delta).await?;
        log::info!("Balance of user {} changed by {} to {}", user_id, delta, balance);
        Ok(balance)
    }

    /// Stored value for `key`, or `None` when absent or unreadable.
    pub async fn get_setting(&self, key: &str) -> Option<String> {
        match self.backend.get_setting(key).await {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to read setting '{}': {}", key, e);
                None
            }
        }
    }

    pub async fn setting_or(&self, key: &str, fallback: &str) -> String {
        self.get_setting(key).await.unwrap_or_else(|| fallback.to_string())
    }

    /// Stored value for `key`, or its documented fallback text.
    pub async fn display_setting(&self, key: &str) -> String {
        self.setting_or(key, fallback_for(key)).await
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> LedgerResult<()> {
        self.backend.set_setting(key, value).await?;
        log::info!("Setting '{}' updated", key);
        Ok(())
    }

    /// Stores a `/save` note, stamped with the current UTC time.
    pub async fn save_note(&self, user_id: i64, text: &str) -> LedgerResult<()> {
        let saved_at = chrono::Utc::now().format(JOINED_AT_FORMAT).to_string();
        self.backend.append_note(user_id, text, &saved_at).await?;
        log::info!("Saved note from user {} in {} ledger", user_id, self.backend.name());
        Ok(())
    }
}
