//! JSON builders for incoming updates
//!
//! teloxide's `Message` has too many fields to construct by hand, so tests
//! deserialize minimal Bot API payloads instead.

#![allow(dead_code)]

use serde_json::{json, Value};
use teloxide::types::{Update, UpdateKind};

/// Sender of a test update
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub first_name: &'static str,
    pub username: Option<&'static str>,
}

impl TestUser {
    pub const fn new(id: i64, first_name: &'static str, username: Option<&'static str>) -> Self {
        Self {
            id,
            first_name,
            username,
        }
    }

    fn user_json(&self) -> Value {
        let mut user = json!({
            "id": self.id,
            "is_bot": false,
            "first_name": self.first_name,
        });
        if let Some(username) = self.username {
            user["username"] = json!(username);
        }
        user
    }

    fn chat_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "private",
            "first_name": self.first_name,
        })
    }
}

fn message_json(user: &TestUser, message_id: i32) -> Value {
    json!({
        "message_id": message_id,
        "date": 1700000000,
        "chat": user.chat_json(),
        "from": user.user_json(),
    })
}

/// Goes through a string: `Update`'s untagged kind falls back to
/// `UpdateKind::Error` when fed a `Value` directly.
fn to_update(value: Value) -> Update {
    serde_json::from_str(&value.to_string()).expect("valid update json")
}

pub fn text_update(user: &TestUser, text: &str) -> Update {
    let mut message = message_json(user, 10);
    message["text"] = json!(text);
    if text.starts_with('/') {
        let len = text.split_whitespace().next().map(|cmd| cmd.encode_utf16().count()).unwrap_or(0);
        message["entities"] = json!([{"type": "bot_command", "offset": 0, "length": len}]);
    }
    to_update(json!({"update_id": 1, "message": message}))
}

pub fn photo_update(user: &TestUser, caption: Option<&str>) -> Update {
    let mut message = message_json(user, 11);
    message["photo"] = json!([
        {"file_id": "small_id", "file_unique_id": "small_uid", "width": 90, "height": 90, "file_size": 1024},
        {"file_id": "large_id", "file_unique_id": "large_uid", "width": 800, "height": 800, "file_size": 64000}
    ]);
    if let Some(caption) = caption {
        message["caption"] = json!(caption);
    }
    to_update(json!({"update_id": 2, "message": message}))
}

/// A button press on a menu message the bot sent earlier.
pub fn callback_update(user: &TestUser, data: &str) -> Update {
    let mut menu_message = message_json(user, 42);
    menu_message["from"] = json!({"id": 5000, "is_bot": true, "first_name": "Meow", "username": "meow_bot"});
    menu_message["text"] = json!("menu");
    to_update(json!({
        "update_id": 3,
        "callback_query": {
            "id": "cbq-1",
            "from": user.user_json(),
            "chat_instance": "instance-1",
            "message": menu_message,
            "data": data,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: TestUser = TestUser::new(1, "Test", Some("test_user"));

    #[test]
    fn test_builders_produce_typed_updates() {
        for update in [text_update(&USER, "/start"), text_update(&USER, "hello"), photo_update(&USER, Some("paid"))] {
            assert!(
                matches!(update.kind, UpdateKind::Message(_)),
                "expected a message update, got {:?}",
                update.kind
            );
        }
        let callback = callback_update(&USER, "premium_prices");
        assert!(
            matches!(callback.kind, UpdateKind::CallbackQuery(_)),
            "expected a callback update, got {:?}",
            callback.kind
        );
    }

    #[test]
    fn test_builders_keep_payload() {
        let UpdateKind::Message(msg) = text_update(&USER, "/save hi").kind else {
            panic!("not a message");
        };
        assert_eq!(msg.text(), Some("/save hi"));
        assert_eq!(msg.from.as_ref().map(|u| u.id.0), Some(1));

        let UpdateKind::Message(msg) = photo_update(&USER, None).kind else {
            panic!("not a message");
        };
        assert_eq!(msg.photo().map(|sizes| sizes.len()), Some(2));

        let UpdateKind::CallbackQuery(q) = callback_update(&USER, "pay_wave").kind else {
            panic!("not a callback");
        };
        assert_eq!(q.data.as_deref(), Some("pay_wave"));
    }
}
