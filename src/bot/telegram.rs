use std::time::Duration;

use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BotUser {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Minimal Telegram Bot API client using long polling.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> anyhow::Result<Self> {
        Self::with_base(&format!("https://api.telegram.org/bot{token}"))
    }

    pub fn with_base(base: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("build telegram http client")?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> anyhow::Result<T> {
        let resp: TgResponse<T> = self
            .http
            .post(format!("{}/{}", self.base, method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("telegram {method}"))?
            .json()
            .await
            .with_context(|| format!("decode telegram {method}"))?;
        unwrap_response(method, resp)
    }

    pub async fn get_me(&self) -> anyhow::Result<BotUser> {
        self.call("getMe", json!({}), Duration::from_secs(15)).await
    }

    /// Waits up to `timeout_secs` for updates with id >= `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> anyhow::Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({ "offset": offset, "timeout": timeout_secs, "allowed_updates": ["message"] }),
            Duration::from_secs(timeout_secs + 10),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let body = serde_json::to_value(SendMessage { chat_id, text })?;
        let _: serde_json::Value = self
            .call("sendMessage", body, Duration::from_secs(15))
            .await?;
        Ok(())
    }
}

fn unwrap_response<T>(method: &str, resp: TgResponse<T>) -> anyhow::Result<T> {
    match (resp.ok, resp.result) {
        (true, Some(result)) => Ok(result),
        _ => anyhow::bail!(
            "telegram {method} failed: {}",
            resp.description.as_deref().unwrap_or("no description")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_decode_from_bot_api_json() {
        let raw = r#"{"ok":true,"result":[
            {"update_id":10,"message":{"message_id":1,"chat":{"id":42,"type":"private"},"text":"/count"}},
            {"update_id":11,"edited_message":{"message_id":1,"chat":{"id":42,"type":"private"}}}
        ]}"#;
        let resp: TgResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = unwrap_response("getUpdates", resp).unwrap();
        assert_eq!(updates.len(), 2);
        let msg = updates[0].message.as_ref().expect("message");
        assert_eq!(msg.chat.id, 42);
        assert_eq!(msg.text.as_deref(), Some("/count"));
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn failed_call_surfaces_description() {
        let raw = r#"{"ok":false,"description":"Unauthorized"}"#;
        let resp: TgResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let err = unwrap_response("getUpdates", resp).unwrap_err();
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[test]
    fn token_goes_into_base_url() {
        let tg = TelegramClient::new("123:abc").unwrap();
        assert_eq!(tg.base, "https://api.telegram.org/bot123:abc");
    }
}
