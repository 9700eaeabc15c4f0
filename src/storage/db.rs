//! SQLite ledger backend
//!
//! Local single-file store used for development and tests. Same shape as
//! the Postgres tables: `users`, `settings` and `notes`.

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::ledger::{apply_delta, LedgerBackend, LedgerError, LedgerResult, UserRecord};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and makes sure
/// the ledger tables exist.
///
/// # Example
///
/// ```no_run
/// use meowpay::storage::db;
///
/// let pool = db::create_pool("meowpay.sqlite")?;
/// # Ok::<(), r2d2::Error>(())
/// ```
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = migrate_schema(&conn) {
        log::warn!("Failed to migrate schema: {}", e);
    }

    Ok(pool)
}

/// Get a connection from the pool
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Creates the ledger tables if they do not exist yet.
fn migrate_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            username TEXT,
            first_name TEXT NOT NULL DEFAULT '',
            join_date TEXT NOT NULL,
            coin_balance INTEGER NOT NULL DEFAULT 0 CHECK (coin_balance >= 0)
        );
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            saved_at TEXT NOT NULL
        );",
    )
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        joined_at: row.get(3)?,
        coin_balance: row.get(4)?,
    })
}

/// Looks a user up by Telegram id.
pub fn get_user(conn: &DbConnection, user_id: i64) -> rusqlite::Result<Option<UserRecord>> {
    conn.query_row(
        "SELECT user_id, username, first_name, join_date, coin_balance FROM users WHERE user_id = ?1",
        params![user_id],
        user_from_row,
    )
    .optional()
}

/// Inserts the user unless the id is already present.
///
/// Returns `true` when a row was created.
pub fn create_user_if_absent(conn: &DbConnection, record: &UserRecord) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO users (user_id, username, first_name, join_date, coin_balance)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id) DO NOTHING",
        params![
            record.user_id,
            record.username,
            record.first_name,
            record.joined_at,
            record.coin_balance
        ],
    )?;
    Ok(inserted == 1)
}

/// Applies `delta` inside an immediate transaction so concurrent writers serialize.
pub fn adjust_user_balance(conn: &mut DbConnection, user_id: i64, delta: i64) -> LedgerResult<i64> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current: Option<i64> = tx
        .query_row(
            "SELECT coin_balance FROM users WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    let current = current.ok_or(LedgerError::UserNotFound(user_id))?;
    let next = apply_delta(user_id, current, delta)?;
    tx.execute(
        "UPDATE users SET coin_balance = ?1 WHERE user_id = ?2",
        params![next, user_id],
    )?;
    tx.commit()?;
    Ok(next)
}

/// Number of ledger rows.
pub fn count_users(conn: &DbConnection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

pub fn get_setting(conn: &DbConnection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
}

pub fn set_setting(conn: &DbConnection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn insert_note(conn: &DbConnection, user_id: i64, text: &str, saved_at: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO notes (user_id, text, saved_at) VALUES (?1, ?2, ?3)",
        params![user_id, text, saved_at],
    )?;
    Ok(())
}

/// Notes saved by one user, oldest first.
pub fn get_notes(conn: &DbConnection, user_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT text FROM notes WHERE user_id = ?1 ORDER BY id")?;
    let notes = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(notes)
}

/// [`LedgerBackend`] over an r2d2 SQLite pool.
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn open(database_path: &str) -> LedgerResult<Self> {
        Ok(Self::new(create_pool(database_path)?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerBackend for SqliteLedger {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn init(&self) -> LedgerResult<()> {
        let conn = get_connection(&self.pool)?;
        migrate_schema(&conn)?;
        Ok(())
    }

    async fn find_user(&self, user_id: i64) -> LedgerResult<Option<UserRecord>> {
        let conn = get_connection(&self.pool)?;
        Ok(get_user(&conn, user_id)?)
    }

    async fn insert_user_if_absent(&self, record: &UserRecord) -> LedgerResult<bool> {
        let conn = get_connection(&self.pool)?;
        Ok(create_user_if_absent(&conn, record)?)
    }

    async fn adjust_balance(&self, user_id: i64, delta: i64) -> LedgerResult<i64> {
        let mut conn = get_connection(&self.pool)?;
        adjust_user_balance(&mut conn, user_id, delta)
    }

    async fn get_setting(&self, key: &str) -> LedgerResult<Option<String>> {
        let conn = get_connection(&self.pool)?;
        Ok(get_setting(&conn, key)?)
    }

    async fn set_setting(&self, key: &str, value: &str) -> LedgerResult<()> {
        let conn = get_connection(&self.pool)?;
        Ok(set_setting(&conn, key, value)?)
    }

    async fn append_note(&self, user_id: i64, text: &str, saved_at: &str) -> LedgerResult<()> {
        let conn = get_connection(&self.pool)?;
        Ok(insert_note(&conn, user_id, text, saved_at)?)
    }
}
