//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup configuration summary with secrets masked

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Shows the first and last few characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Logs the effective configuration at application startup
pub fn log_configuration() {
    use secrecy::ExposeSecret;

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.is_empty() {
        log::error!("BOT_TOKEN: not set");
    } else {
        log::info!("BOT_TOKEN: {}", mask_secret(&config::BOT_TOKEN));
    }

    match *config::admin::ADMIN_CHAT_ID {
        0 => log::error!("ADMIN_CHAT_ID: not set"),
        id => log::info!("ADMIN_CHAT_ID: {}", id),
    }
    if !config::admin::ADMIN_IDS.is_empty() {
        log::info!("ADMIN_IDS: {:?}", *config::admin::ADMIN_IDS);
    }

    match config::ledger::backend_kind() {
        Ok(kind) => log::info!("Ledger backend: {:?}", kind),
        Err(e) => log::error!("Ledger backend: {}", e),
    }
    if let Some(ref sheet_id) = *config::ledger::GOOGLE_SHEET_ID {
        log::info!("GOOGLE_SHEET_ID: {}", sheet_id);
    }
    if config::ledger::GOOGLE_SA_JSON.is_some() {
        log::info!("GOOGLE_SA_JSON: set");
    }
    if let Some(ref token) = *config::ledger::GOOGLE_SHEETS_TOKEN {
        log::info!("GOOGLE_SHEETS_TOKEN: {} (overrides service account)", mask_secret(token.expose_secret()));
    }
    if config::ledger::DATABASE_URL.is_some() {
        log::info!("DATABASE_URL: set");
    }

    match *config::WEBHOOK_URL {
        Some(ref url) => log::info!("WEBHOOK_URL: {} (port {})", url, *config::PORT),
        None => log::info!("WEBHOOK_URL: not set, long polling"),
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
