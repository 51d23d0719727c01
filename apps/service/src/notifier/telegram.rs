use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::NotifyError;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram bot API transport
///
/// Holds one HTTP client that is safe to share between monitor tasks.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;

        Ok(Self { client, base_url: TELEGRAM_API_URL.to_string() })
    }

    /// Point the notifier at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn send_message_url(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.base_url.trim_end_matches('/'), token)
    }

    /// Send an HTML formatted message to `chat_id`
    pub async fn notify(&self, chat_id: &str, text: &str, token: &str) -> Result<(), NotifyError> {
        let message = TelegramMessage { chat_id, text, parse_mode: "HTML" };

        let response =
            self.client.post(self.send_message_url(token)).json(&message).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Transport { status: status.as_u16(), body });
        }

        debug!(chat_id, "Telegram alert sent");
        Ok(())
    }
}
