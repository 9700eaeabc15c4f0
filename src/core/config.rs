use once_cell::sync::Lazy;
use std::env;

use crate::core::error::AppError;

/// Reads an environment variable, treating blank values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    non_empty_var("BOT_TOKEN")
        .or_else(|| non_empty_var("TELOXIDE_TOKEN"))
        .unwrap_or_default()
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Webhook URL for Telegram updates
/// Read from WEBHOOK_URL environment variable
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("WEBHOOK_URL"));

/// Port the webhook listener binds to
/// Read from PORT environment variable
/// Default: 10000
pub static PORT: Lazy<u16> = Lazy::new(|| {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10000)
});

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    pub(crate) fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Chat that receives payment screenshots and startup notices.
    /// Read from ADMIN_CHAT_ID environment variable (required)
    /// 0 when unset or unparsable
    pub static ADMIN_CHAT_ID: Lazy<i64> = Lazy::new(|| {
        env::var("ADMIN_CHAT_ID")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    });

    /// Additional admin user IDs (comma-separated)
    /// Read from ADMIN_IDS environment variable
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default()
    });

    /// Every user id allowed to run admin commands.
    pub fn all_admin_ids() -> Vec<i64> {
        let mut ids = ADMIN_IDS.clone();
        if *ADMIN_CHAT_ID != 0 && !ids.contains(&ADMIN_CHAT_ID) {
            ids.push(*ADMIN_CHAT_ID);
        }
        ids
    }
}

/// Ledger backend configuration
pub mod ledger {
    use super::non_empty_var;
    use once_cell::sync::Lazy;
    use secrecy::SecretString;
    use std::env;

    /// Which store holds the user ledger and settings
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BackendKind {
        Sheets,
        Postgres,
        Sqlite,
    }

    /// Explicit backend choice
    /// Read from LEDGER_BACKEND environment variable ("sheets", "postgres", "sqlite")
    pub static LEDGER_BACKEND: Lazy<Option<String>> =
        Lazy::new(|| non_empty_var("LEDGER_BACKEND").map(|s| s.to_lowercase()));

    /// Google spreadsheet id
    /// Read from GOOGLE_SHEET_ID environment variable
    pub static GOOGLE_SHEET_ID: Lazy<Option<String>> = Lazy::new(|| non_empty_var("GOOGLE_SHEET_ID"));

    /// Service-account key for the Sheets API, as JSON or a path to the key file
    /// Read from GOOGLE_SA_JSON environment variable
    pub static GOOGLE_SA_JSON: Lazy<Option<SecretString>> =
        Lazy::new(|| non_empty_var("GOOGLE_SA_JSON").map(SecretString::from));

    /// Fixed OAuth bearer token; overrides GOOGLE_SA_JSON when set
    /// Read from GOOGLE_SHEETS_TOKEN environment variable
    pub static GOOGLE_SHEETS_TOKEN: Lazy<Option<SecretString>> =
        Lazy::new(|| non_empty_var("GOOGLE_SHEETS_TOKEN").map(SecretString::from));

    /// Sheets API base URL
    /// Read from GOOGLE_SHEETS_API_URL environment variable
    /// Default: https://sheets.googleapis.com
    pub static GOOGLE_SHEETS_API_URL: Lazy<String> = Lazy::new(|| {
        non_empty_var("GOOGLE_SHEETS_API_URL").unwrap_or_else(|| "https://sheets.googleapis.com".to_string())
    });

    /// Postgres connection string
    /// Read from DATABASE_URL environment variable
    pub static DATABASE_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("DATABASE_URL"));

    /// SQLite database file path
    /// Read from DATABASE_PATH environment variable
    /// Default: meowpay.sqlite
    pub static DATABASE_PATH: Lazy<String> =
        Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "meowpay.sqlite".to_string()));

    /// Decides the backend from an explicit choice or from which credentials are present.
    pub fn resolve_backend(
        explicit: Option<&str>,
        sheet_id: Option<&str>,
        database_url: Option<&str>,
    ) -> Result<BackendKind, String> {
        match explicit {
            Some("sheets") => Ok(BackendKind::Sheets),
            Some("postgres") => Ok(BackendKind::Postgres),
            Some("sqlite") => Ok(BackendKind::Sqlite),
            Some(other) => Err(format!("unknown LEDGER_BACKEND '{}'", other)),
            None => {
                if sheet_id.is_some() {
                    Ok(BackendKind::Sheets)
                } else if database_url.is_some_and(|url| url.starts_with("postgres")) {
                    Ok(BackendKind::Postgres)
                } else {
                    Ok(BackendKind::Sqlite)
                }
            }
        }
    }

    /// Backend selected by the current environment.
    pub fn backend_kind() -> Result<BackendKind, String> {
        resolve_backend(
            LEDGER_BACKEND.as_deref(),
            GOOGLE_SHEET_ID.as_deref(),
            DATABASE_URL.as_deref(),
        )
    }
}

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Request timeout for Bot API and Sheets API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Checks that every variable needed to serve traffic is present.
///
/// Returns `AppError::Config` naming all missing variables at once, so a
/// misconfigured deploy fails with one readable message.
pub fn validate_required() -> Result<(), AppError> {
    let mut missing = Vec::new();

    if BOT_TOKEN.is_empty() {
        missing.push("BOT_TOKEN");
    }
    if *admin::ADMIN_CHAT_ID == 0 {
        missing.push("ADMIN_CHAT_ID");
    }

    match ledger::backend_kind().map_err(AppError::Config)? {
        ledger::BackendKind::Sheets => {
            if ledger::GOOGLE_SHEET_ID.is_none() {
                missing.push("GOOGLE_SHEET_ID");
            }
            if ledger::GOOGLE_SA_JSON.is_none() && ledger::GOOGLE_SHEETS_TOKEN.is_none() {
                missing.push("GOOGLE_SA_JSON (or GOOGLE_SHEETS_TOKEN)");
            }
        }
        ledger::BackendKind::Postgres => {
            if ledger::DATABASE_URL.is_none() {
                missing.push("DATABASE_URL");
            }
        }
        ledger::BackendKind::Sqlite => {}
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "missing required environment variables: {}",
            missing.join(", ")
        )))
    }
}
