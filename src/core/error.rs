use thiserror::Error;

use crate::storage::LedgerError;

/// Centralized error types for the application
///
/// Handlers deal with ledger failures themselves; this enum is what bubbles
/// up to `main` and the CLI subcommands.
#[derive(Error, Debug)]
pub enum AppError {
    /// Ledger/settings store errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
