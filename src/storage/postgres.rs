//! Postgres ledger backend
//!
//! The relational alternative to the spreadsheet: `users` keyed by
//! `user_id`, `settings` keyed by `key`, and an append-only `notes` table.
//! Inserts and balance changes are single statements, so concurrent
//! updates to one user cannot lose writes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::ledger::{LedgerBackend, LedgerError, LedgerResult, UserRecord, JOINED_AT_FORMAT};

const MAX_CONNECTIONS: u32 = 5;

/// SQLSTATE `numeric_value_out_of_range`, raised when `coin_balance + delta` leaves BIGINT.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

/// Parses a `joined_at` string, falling back to now for foreign formats.
fn joined_at_to_timestamp(joined_at: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(joined_at, JOINED_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

fn is_out_of_range(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE),
        _ => false,
    }
}

/// Reports BIGINT overflow the same way `apply_delta` does on the other backends.
fn map_adjust_error(err: sqlx::Error, delta: i64) -> LedgerError {
    if is_out_of_range(&err) {
        LedgerError::InvalidAmount(format!("balance + {} overflows", delta))
    } else {
        LedgerError::Postgres(err)
    }
}

type UserRow = (i64, Option<String>, String, DateTime<Utc>, i64);

fn record_from_row((user_id, username, first_name, join_date, coin_balance): UserRow) -> UserRecord {
    UserRecord {
        user_id,
        username,
        first_name,
        joined_at: join_date.format(JOINED_AT_FORMAT).to_string(),
        coin_balance,
    }
}

#[async_trait]
impl LedgerBackend for PgLedger {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn init(&self) -> LedgerResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                user_id BIGINT PRIMARY KEY,
                username TEXT,
                first_name TEXT NOT NULL DEFAULT '',
                join_date TIMESTAMPTZ NOT NULL DEFAULT now(),
                coin_balance BIGINT NOT NULL DEFAULT 0 CHECK (coin_balance >= 0)
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notes (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                text TEXT NOT NULL,
                saved_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user(&self, user_id: i64) -> LedgerResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, first_name, join_date, coin_balance FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(record_from_row))
    }

    async fn insert_user_if_absent(&self, record: &UserRecord) -> LedgerResult<bool> {
        let result = sqlx::query(
            "INSERT INTO users (user_id, username, first_name, join_date, coin_balance)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(record.user_id)
        .bind(&record.username)
        .bind(&record.first_name)
        .bind(joined_at_to_timestamp(&record.joined_at))
        .bind(record.coin_balance)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn adjust_balance(&self, user_id: i64, delta: i64) -> LedgerResult<i64> {
        let updated: Option<(i64,)> = sqlx::query_as(
            "UPDATE users SET coin_balance = coin_balance + $2
             WHERE user_id = $1 AND coin_balance + $2 >= 0
             RETURNING coin_balance",
        )
        .bind(user_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_adjust_error(e, delta))?;

        if let Some((balance,)) = updated {
            return Ok(balance);
        }

        // Nothing updated: tell a missing user apart from an overdraw.
        let current: Option<(i64,)> = sqlx::query_as("SELECT coin_balance FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            Some((current,)) => Err(LedgerError::InsufficientBalance { user_id, current, delta }),
            None => Err(LedgerError::UserNotFound(user_id)),
        }
    }

    async fn get_setting(&self, key: &str) -> LedgerResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_setting(&self, key: &str, value: &str) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_note(&self, user_id: i64, text: &str, saved_at: &str) -> LedgerResult<()> {
        sqlx::query("INSERT INTO notes (user_id, text, saved_at) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(text)
            .bind(joined_at_to_timestamp(saved_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
