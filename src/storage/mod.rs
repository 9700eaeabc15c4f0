//! User ledger and settings storage backends

pub mod db;
pub mod google_auth;
pub mod ledger;
pub mod postgres;
pub mod sheets;

use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::core::config::{self, ledger::BackendKind};
use crate::core::error::{AppError, AppResult};

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool, SqliteLedger};
pub use google_auth::{token_source, AccessTokenSource};
pub use ledger::{Ledger, LedgerBackend, LedgerError, LedgerResult, UserRecord};
pub use postgres::PgLedger;
pub use sheets::SheetsLedger;

/// Builds the ledger selected by the environment.
///
/// Fails when the selected backend is missing its credentials or cannot be
/// reached; callers treat that as fatal at startup.
pub async fn open_ledger() -> AppResult<Ledger> {
    let kind = config::ledger::backend_kind().map_err(AppError::Config)?;
    let backend: Arc<dyn LedgerBackend> = match kind {
        BackendKind::Sheets => {
            let sheet_id = config::ledger::GOOGLE_SHEET_ID
                .clone()
                .ok_or_else(|| AppError::Config("GOOGLE_SHEET_ID is not set".to_string()))?;
            let auth = token_source(
                config::ledger::GOOGLE_SHEETS_TOKEN.clone(),
                config::ledger::GOOGLE_SA_JSON.as_ref().map(|json| json.expose_secret()),
            )?;
            Arc::new(SheetsLedger::connect(&config::ledger::GOOGLE_SHEETS_API_URL, &sheet_id, auth)?)
        }
        BackendKind::Postgres => {
            let url = config::ledger::DATABASE_URL
                .clone()
                .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
            Arc::new(PgLedger::connect(&url).await?)
        }
        BackendKind::Sqlite => Arc::new(SqliteLedger::open(&config::ledger::DATABASE_PATH)?),
    };

    log::info!("Using {} ledger backend", backend.name());
    Ok(Ledger::new(backend))
}
