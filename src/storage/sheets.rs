//! Google Sheets ledger backend
//!
//! Layout:
//! - `Sheet1`: one user per row, columns A–E = id, username, name, joined_at, balance
//! - `Settings`: key/value pairs in columns A–B
//! - `Notes`: `/save` notes in columns A–C = id, text, timestamp
//!
//! Rows are located by scanning a whole column. Nothing here is atomic: two
//! concurrent balance changes for one user both read the same cell and the
//! later write wins, and two concurrent registrations of one id can both
//! append. A spreadsheet offers no compare-and-set, so this is accepted.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use std::sync::Arc;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::google_auth::AccessTokenSource;
use super::ledger::{apply_delta, LedgerBackend, LedgerError, LedgerResult, UserRecord};
use crate::core::config;

pub const USERS_TAB: &str = "Sheet1";
pub const SETTINGS_TAB: &str = "Settings";
pub const NOTES_TAB: &str = "Notes";

const USERS_HEADER: [&str; 5] = ["id", "username", "name", "timestamp", "balance"];
const SETTINGS_HEADER: [&str; 2] = ["key", "value"];
const NOTES_HEADER: [&str; 3] = ["id", "text", "timestamp"];

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Renders a cell as text; integral numbers lose their `.0`.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15) {
                (f as i64).to_string()
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Balance cell to integer; missing, garbage or negative cells count as 0.
pub(crate) fn parse_balance(cell: Option<&Value>) -> i64 {
    let text = cell.map(cell_text).unwrap_or_default();
    if text.is_empty() {
        return 0;
    }
    match text.parse::<i64>() {
        Ok(balance) if balance >= 0 => balance,
        _ => {
            log::warn!("Unparsable balance cell '{}', treating as 0", text);
            0
        }
    }
}

fn optional_text(cell: Option<&Value>) -> Option<String> {
    cell.map(cell_text).filter(|s| !s.is_empty())
}

pub struct SheetsLedger {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    auth: Arc<dyn AccessTokenSource>,
}

impl SheetsLedger {
    pub fn new(
        client: Client,
        base_url: Url,
        spreadsheet_id: impl Into<String>,
        auth: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            auth,
        }
    }

    /// Builds a client against `base_url` with the configured network timeout.
    pub fn connect(base_url: &str, spreadsheet_id: &str, auth: Arc<dyn AccessTokenSource>) -> LedgerResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| LedgerError::Malformed(format!("invalid Sheets API URL: {}", e)))?;
        let client = Client::builder().timeout(config::network::timeout()).build()?;
        log::info!("Sheets API authenticated with {}", auth.kind());
        Ok(Self::new(client, base_url, spreadsheet_id, auth))
    }

    fn values_url(&self, range: &str, suffix: &str) -> LedgerResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::Malformed("Sheets API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn check(response: Response) -> LedgerResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LedgerError::SheetsStatus {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_values(&self, range: &str) -> LedgerResult<Vec<Vec<Value>>> {
        let url = self.values_url(range, "")?;
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .get(url)
            .query(&[("valueRenderOption", "UNFORMATTED_VALUE")])
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        let range: ValueRange = Self::check(response).await?.json().await?;
        Ok(range.values)
    }

    async fn update_values(&self, range: &str, values: Vec<Vec<Value>>) -> LedgerResult<()> {
        let url = self.values_url(range, "")?;
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(token.expose_secret())
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": values }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn append_row(&self, range: &str, row: Vec<Value>) -> LedgerResult<()> {
        let url = self.values_url(range, ":append")?;
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(token.expose_secret())
            .json(&json!({ "majorDimension": "ROWS", "values": [row] }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// 1-based row of `user_id` in the id column.
    async fn find_user_row(&self, user_id: i64) -> LedgerResult<Option<usize>> {
        let needle = user_id.to_string();
        let column = self.get_values(&format!("{}!A:A", USERS_TAB)).await?;
        Ok(column
            .iter()
            .position(|row| row.first().map(cell_text).as_deref() == Some(needle.as_str()))
            .map(|index| index + 1))
    }

    /// 1-based row of `key` in the settings tab, plus its value cell.
    async fn find_setting(&self, key: &str) -> LedgerResult<Option<(usize, Option<String>)>> {
        let rows = self.get_values(&format!("{}!A:B", SETTINGS_TAB)).await?;
        Ok(rows
            .iter()
            .position(|row| row.first().map(cell_text).as_deref() == Some(key))
            .map(|index| (index + 1, optional_text(rows[index].get(1)))))
    }

    async fn ensure_header(&self, range: &str, header: &[&str]) -> LedgerResult<()> {
        let existing = self.get_values(range).await?;
        if existing.iter().any(|row| !row.is_empty()) {
            return Ok(());
        }
        log::info!("Writing header row to {}", range);
        let row = header.iter().map(|h| json!(h)).collect();
        self.update_values(range, vec![row]).await
    }
}

#[async_trait]
impl LedgerBackend for SheetsLedger {
    fn name(&self) -> &'static str {
        "sheets"
    }

    async fn init(&self) -> LedgerResult<()> {
        self.ensure_header(&format!("{}!A1:E1", USERS_TAB), &USERS_HEADER).await?;
        self.ensure_header(&format!("{}!A1:B1", SETTINGS_TAB), &SETTINGS_HEADER)
            .await?;
        self.ensure_header(&format!("{}!A1:C1", NOTES_TAB), &NOTES_HEADER).await
    }

    async fn find_user(&self, user_id: i64) -> LedgerResult<Option<UserRecord>> {
        let Some(row) = self.find_user_row(user_id).await? else {
            return Ok(None);
        };
        let values = self.get_values(&format!("{}!A{}:E{}", USERS_TAB, row, row)).await?;
        let cells = values.into_iter().next().unwrap_or_default();

        Ok(Some(UserRecord {
            user_id,
            username: optional_text(cells.get(1)),
            first_name: optional_text(cells.get(2)).unwrap_or_default(),
            joined_at: optional_text(cells.get(3)).unwrap_or_default(),
            coin_balance: parse_balance(cells.get(4)),
        }))
    }

    async fn insert_user_if_absent(&self, record: &UserRecord) -> LedgerResult<bool> {
        if self.find_user_row(record.user_id).await?.is_some() {
            return Ok(false);
        }
        let row = vec![
            json!(record.user_id),
            json!(record.username.clone().unwrap_or_default()),
            json!(record.first_name),
            json!(record.joined_at),
            json!(record.coin_balance),
        ];
        self.append_row(&format!("{}!A:E", USERS_TAB), row).await?;
        Ok(true)
    }

    async fn adjust_balance(&self, user_id: i64, delta: i64) -> LedgerResult<i64> {
        let row = self
            .find_user_row(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;
        let cell = format!("{}!E{}", USERS_TAB, row);

        let values = self.get_values(&cell).await?;
        let current = parse_balance(values.first().and_then(|r| r.first()));
        let next = apply_delta(user_id, current, delta)?;

        self.update_values(&cell, vec![vec![json!(next)]]).await?;
        Ok(next)
    }

    async fn get_setting(&self, key: &str) -> LedgerResult<Option<String>> {
        Ok(self.find_setting(key).await?.and_then(|(_, value)| value))
    }

    async fn set_setting(&self, key: &str, value: &str) -> LedgerResult<()> {
        match self.find_setting(key).await? {
            Some((row, _)) => {
                self.update_values(&format!("{}!B{}", SETTINGS_TAB, row), vec![vec![json!(value)]])
                    .await
            }
            None => {
                self.append_row(&format!("{}!A:B", SETTINGS_TAB), vec![json!(key), json!(value)])
                    .await
            }
        }
    }

    async fn append_note(&self, user_id: i64, text: &str, saved_at: &str) -> LedgerResult<()> {
        self.append_row(
            &format!("{}!A:C", NOTES_TAB),
            vec![json!(user_id), json!(text), json!(saved_at)],
        )
        .await
    }
}
