//! Outbound notification delivery.
//!
//! The polling loops only ever see the `Notifier` trait; the production
//! implementation posts to the Telegram Bot API. Delivery failures are
//! surfaced as a typed error for the caller to log - nothing here is ever
//! fatal to the monitoring process.

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::TelegramConfig;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one formatted message to the operator channel.
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    send_message_url: String,
    chat_id: i64,
}

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_api_base(TELEGRAM_API_BASE, config)
    }

    /// Point the notifier at a different API host. Used by tests to swap in
    /// a mock server.
    pub fn with_api_base(base: &str, config: &TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            send_message_url: format!(
                "{}/bot{}/sendMessage",
                base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip_all)]
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
        });

        let response = self
            .client
            .post(&self.send_message_url)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            info!("delivered notification ({} chars)", text.len());
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected { status, body })
    }
}
