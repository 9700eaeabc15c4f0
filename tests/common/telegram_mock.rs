//! Mock Bot API server that records every request

#![allow(dead_code)]

use std::time::Duration;

use teloxide::Bot;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A single request the bot made
#[derive(Debug, Clone)]
pub struct ApiCall {
    /// Bot API method, lowercased (e.g. "sendmessage")
    pub method: String,
    /// Request body (JSON)
    pub body: serde_json::Value,
}

impl ApiCall {
    pub fn chat_id(&self) -> Option<i64> {
        self.body.get("chat_id").and_then(|v| v.as_i64())
    }

    pub fn text(&self) -> &str {
        self.body.get("text").and_then(|v| v.as_str()).unwrap_or_default()
    }
}

/// Bot API stand-in backed by wiremock
pub struct TelegramMock {
    server: MockServer,
}

impl TelegramMock {
    /// Starts a server answering every Bot API method successfully.
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        // Methods returning `true` must be mounted before the catch-all
        for name in ["answercallbackquery", "setmycommands"] {
            Mock::given(method("POST"))
                .and(path_regex(format!("(?i)^/bot[^/]+/{}$", regex::escape(name))))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "ok": true,
                    "result": true
                })))
                .mount(&server)
                .await;
        }

        Mock::given(method("POST"))
            .and(path_regex("^/bot[^/]+/[A-Za-z]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {
                    "message_id": 1000,
                    "date": 1700000000,
                    "chat": {"id": 1, "type": "private", "first_name": "Test"},
                    "text": "ok"
                }
            })))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Create a Bot instance that uses this mock server
    pub fn create_bot(&self) -> Bot {
        let url = reqwest::Url::parse(&self.server.uri()).expect("mock server uri");
        Bot::new("test_token_12345:ABCDEF").set_api_url(url)
    }

    /// All requests received so far, in order.
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|request| ApiCall {
                method: request
                    .url
                    .path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_lowercase))
                    .unwrap_or_default(),
                body: serde_json::from_slice(&request.body).unwrap_or(serde_json::Value::Null),
            })
            .collect()
    }

    /// Requests for one Bot API method (case-insensitive name).
    pub async fn calls_to(&self, api_method: &str) -> Vec<ApiCall> {
        let wanted = api_method.to_lowercase();
        self.calls()
            .await
            .into_iter()
            .filter(|call| call.method == wanted)
            .collect()
    }

    /// Waits for background tasks (admin notifications) to reach the server.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Vec<ApiCall>
    where
        F: FnMut(&[ApiCall]) -> bool,
    {
        for _ in 0..50 {
            let calls = self.calls().await;
            if predicate(&calls) {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.calls().await
    }
}
