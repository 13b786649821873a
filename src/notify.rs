//! Notification channel: Telegram bot messages.

use crate::error::ScrapeError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Fire-and-forget text delivery. Callers treat failures as best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), ScrapeError>;
}

/// Sends messages through the Telegram Bot API.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, ScrapeError> {
        Self::with_api_base(bot_token, chat_id, TELEGRAM_API_BASE)
    }

    /// Custom API base, for pointing tests at a mock server.
    pub fn with_api_base(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, ScrapeError> {
        let api_base = api_base.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ScrapeError::transport(&api_base, e))?;

        Ok(Self { client, api_base, bot_token: bot_token.into(), chat_id: chat_id.into() })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), ScrapeError> {
        let url = format!(
            "{}/bot{}/sendMessage?chat_id={}&text={}",
            self.api_base,
            self.bot_token,
            urlencoding::encode(&self.chat_id),
            urlencoding::encode(text)
        );

        debug!("Sending Telegram message ({} chars)", text.len());

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| ScrapeError::transport("telegram sendMessage", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::transport(
                "telegram sendMessage",
                format!("status {}", status),
            ));
        }

        info!("Notification delivered");
        Ok(())
    }
}

/// Used when no Telegram credentials are configured: messages are dropped
/// after being logged.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, text: &str) -> Result<(), ScrapeError> {
        debug!("Notifications disabled, dropping message ({} chars)", text.len());
        Ok(())
    }
}
