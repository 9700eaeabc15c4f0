//! Test fixtures for handler tests
//!
//! Provides TestEnvironment that sets up everything a handler needs:
//! - Mock Telegram server
//! - SQLite ledger in a temporary directory
//! - Handler dependencies wired like production

#![allow(dead_code)]

use std::ops::ControlFlow;
use std::sync::Arc;

use meowpay::storage::{DbPool, Ledger, SqliteLedger};
use meowpay::telegram::{schema, HandlerDeps};
use teloxide::prelude::*;
use teloxide::types::Update;
use tempfile::TempDir;

use super::TelegramMock;

pub const ADMIN_CHAT_ID: i64 = 999_000;
pub const ADMIN_USER_ID: i64 = 777;

/// Complete test environment for handler tests
///
/// # Example
/// ```ignore
/// let env = TestEnvironment::new().await;
/// env.dispatch(text_update(&USER, "/start")).await;
/// let sent = env.mock.calls_to("sendMessage").await;
/// ```
pub struct TestEnvironment {
    /// Bot pointed at the mock server
    pub bot: Bot,
    pub mock: TelegramMock,
    pub ledger: Ledger,
    /// Pool behind `ledger`, for asserting on tables the facade does not read
    pub pool: DbPool,
    pub deps: HandlerDeps,
    _dir: TempDir,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ledger.sqlite");
        let backend = SqliteLedger::open(path.to_str().expect("utf-8 path")).expect("open sqlite ledger");
        let pool = backend.pool().clone();
        let ledger = Ledger::new(Arc::new(backend));
        ledger.init().await.expect("init ledger");

        let mock = TelegramMock::start().await;
        let bot = mock.create_bot();
        let deps = HandlerDeps::new(
            ledger.clone(),
            ChatId(ADMIN_CHAT_ID),
            vec![ADMIN_USER_ID, ADMIN_CHAT_ID],
            Some("meow_bot".to_string()),
        );

        Self {
            bot,
            mock,
            ledger,
            pool,
            deps,
            _dir: dir,
        }
    }

    /// Runs one update through the production schema.
    pub async fn dispatch(&self, update: Update) {
        let handler = schema(self.deps.clone());
        match handler.dispatch(dptree::deps![self.bot.clone(), update]).await {
            ControlFlow::Break(Ok(())) => {}
            ControlFlow::Break(Err(e)) => panic!("handler failed: {}", e),
            ControlFlow::Continue(_) => panic!("update was not handled by any branch"),
        }
    }
}
