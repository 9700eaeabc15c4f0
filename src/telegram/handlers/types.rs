//! Handler types, dependencies, and user management helpers

use teloxide::prelude::*;
use teloxide::types::User;

use crate::storage::{Ledger, UserRecord};
use crate::telegram::notifications::notify_admin_new_user;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub ledger: Ledger,
    /// Receives payment screenshots and new-user notices
    pub admin_chat_id: ChatId,
    /// Users allowed to run admin commands
    pub admin_ids: Vec<i64>,
    pub bot_username: Option<String>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(ledger: Ledger, admin_chat_id: ChatId, admin_ids: Vec<i64>, bot_username: Option<String>) -> Self {
        Self {
            ledger,
            admin_chat_id,
            admin_ids,
            bot_username,
        }
    }

    /// Check if user is admin
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Sender details carried into the ledger and admin notifications
#[derive(Clone, Debug)]
pub struct UserInfo {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

impl UserInfo {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user_id_of(user),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
        }
    }

    /// Extract user info from a Telegram message; falls back to the chat for channel posts.
    pub fn from_message(msg: &Message) -> Self {
        match msg.from.as_ref() {
            Some(user) => Self::from_user(user),
            None => Self {
                user_id: msg.chat.id.0,
                username: msg.chat.username().map(str::to_string),
                first_name: msg.chat.first_name().unwrap_or_default().to_string(),
            },
        }
    }

    pub fn to_record(&self) -> UserRecord {
        UserRecord::new(self.user_id, self.username.clone(), self.first_name.clone())
    }

    /// `Name (@username, id 123)`
    pub fn describe(&self) -> String {
        match self.username {
            Some(ref username) => format!("{} (@{}, id {})", self.first_name, username, self.user_id),
            None => format!("{} (id {})", self.first_name, self.user_id),
        }
    }
}

/// Telegram user id as the signed id the ledger stores.
pub fn user_id_of(user: &User) -> i64 {
    i64::try_from(user.id.0).unwrap_or(i64::MAX)
}

/// Result of ensure_user_exists operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCreationResult {
    /// User already existed
    Existed,
    /// User was newly created
    Created,
    /// The ledger could not be reached
    StoreError,
}

/// Ensures a user exists in the ledger, creating them if needed.
///
/// Newly created users are announced to the admin chat in a background task.
pub async fn ensure_user_exists(bot: &Bot, deps: &HandlerDeps, user: &UserInfo) -> UserCreationResult {
    match deps.ledger.save_new_user(&user.to_record()).await {
        Ok(true) => {
            let bot = bot.clone();
            let admin_chat_id = deps.admin_chat_id;
            let user = user.clone();
            tokio::spawn(async move {
                notify_admin_new_user(&bot, admin_chat_id, &user).await;
            });
            UserCreationResult::Created
        }
        Ok(false) => UserCreationResult::Existed,
        Err(e) => {
            log::error!("Failed to save user {}: {}", user.user_id, e);
            UserCreationResult::StoreError
        }
    }
}
