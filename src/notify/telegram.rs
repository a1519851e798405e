use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Fire-and-forget Telegram alert sender
///
/// One attempt per message; callers decide what a failure means.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self::with_api_base(TELEGRAM_API_BASE.to_string(), token, chat_id)
    }

    pub fn with_api_base(api_base: String, token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            api_base,
            token,
            chat_id,
        }
    }

    /// Build from `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN")
            .context("TELEGRAM_BOT_TOKEN not found in environment")?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .context("TELEGRAM_CHAT_ID not found in environment")?;
        Ok(Self::new(token, chat_id))
    }

    pub async fn send(&self, message: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: format!("✅ {}", message),
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Telegram")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Telegram API error ({}): {}", status, error_text);
        }

        tracing::info!(chat_id = %self.chat_id, "Alert delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_posts_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::Json(json!({
                "chat_id": "42",
                "text": "✅ Guardian has launched and is online.",
                "parse_mode": "HTML"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .expect(1)
            .create_async()
            .await;

        let notifier =
            TelegramNotifier::with_api_base(server.url(), "TOKEN".to_string(), "42".to_string());
        notifier
            .send("Guardian has launched and is online.")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_message_is_single_attempt_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(401)
            .with_body(r#"{"ok":false,"description":"Unauthorized"}"#)
            .expect(1)
            .create_async()
            .await;

        let notifier =
            TelegramNotifier::with_api_base(server.url(), "TOKEN".to_string(), "42".to_string());
        let err = notifier.send("hello").await.unwrap_err();

        assert!(err.to_string().contains("401"));
        mock.assert_async().await;
    }
}
