//! Bearer tokens for the Sheets API
//!
//! Production uses a service account: `gcp_auth` signs the JWT, exchanges it
//! for an access token and refreshes it before expiry. A fixed token is still
//! accepted as an override for local runs and tests.

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use secrecy::SecretString;
use std::sync::Arc;

use super::ledger::{LedgerError, LedgerResult};

/// Read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Something that hands out a currently valid access token.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Short name for logs.
    fn kind(&self) -> &'static str;

    async fn access_token(&self) -> LedgerResult<SecretString>;
}

/// A token supplied from outside; never refreshed.
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    fn kind(&self) -> &'static str {
        "static token"
    }

    async fn access_token(&self) -> LedgerResult<SecretString> {
        Ok(self.0.clone())
    }
}

/// Service-account credentials; tokens are cached by `gcp_auth` and minted again when stale.
pub struct ServiceAccountToken {
    account: CustomServiceAccount,
}

impl ServiceAccountToken {
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        Ok(Self {
            account: CustomServiceAccount::from_json(json)?,
        })
    }

    /// Accepts either the key JSON itself or a path to the key file.
    pub fn from_env_value(value: &str) -> LedgerResult<Self> {
        let value = value.trim();
        if value.starts_with('{') {
            return Self::from_json(value);
        }
        let json = std::fs::read_to_string(value)
            .map_err(|e| LedgerError::Malformed(format!("cannot read service account file '{}': {}", value, e)))?;
        Self::from_json(&json)
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountToken {
    fn kind(&self) -> &'static str {
        "service account"
    }

    async fn access_token(&self) -> LedgerResult<SecretString> {
        let token = self.account.token(&[SPREADSHEETS_SCOPE]).await?;
        Ok(SecretString::from(token.as_str().to_string()))
    }
}

/// Picks the credential: a fixed token wins, otherwise the service account.
pub fn token_source(
    static_token: Option<SecretString>,
    service_account: Option<&str>,
) -> LedgerResult<Arc<dyn AccessTokenSource>> {
    if let Some(token) = static_token {
        return Ok(Arc::new(StaticToken::new(token)));
    }
    match service_account {
        Some(value) => Ok(Arc::new(ServiceAccountToken::from_env_value(value)?)),
        None => Err(LedgerError::Malformed(
            "no Sheets credential: set GOOGLE_SA_JSON or GOOGLE_SHEETS_TOKEN".to_string(),
        )),
    }
}
