//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod telegram_mock;
pub mod updates;

#[allow(unused_imports)]
pub use fixtures::{TestEnvironment, ADMIN_CHAT_ID, ADMIN_USER_ID};
#[allow(unused_imports)]
pub use telegram_mock::{ApiCall, TelegramMock};
#[allow(unused_imports)]
pub use updates::{callback_update, photo_update, text_update, TestUser};
