use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use super::{NotificationSender, SenderError};
use crate::notifications::models::ChannelConfig;

/// A sender for pushing notifications via a Telegram-style Bot API.
pub struct TelegramSender {
    client: Client,
}

impl TelegramSender {
    pub fn new(timeout: Duration) -> Result<Self, SenderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

pub fn send_message_url(api_base: &str, bot_token: &str) -> String {
    format!("{api_base}{bot_token}/sendMessage")
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, config: &ChannelConfig, message: &str) -> Result<(), SenderError> {
        let (api_base, bot_token, chat_id) = match config {
            ChannelConfig::Telegram {
                api_base,
                bot_token,
                chat_id,
            } => (api_base, bot_token, chat_id),
            _ => {
                return Err(SenderError::InvalidConfiguration(
                    "Expected Telegram config, but found a different type.".to_string(),
                ));
            }
        };

        if bot_token.is_empty() || chat_id.is_empty() {
            return Err(SenderError::InvalidConfiguration(
                "Telegram channel needs both a bot token and a chat id.".to_string(),
            ));
        }

        let payload = TelegramMessage {
            chat_id,
            text: message,
        };

        // `.json()` sets `Content-Type: application/json`.
        let response = self
            .client
            .post(send_message_url(api_base, bot_token))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();

        if status != StatusCode::OK {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(SenderError::SendFailed(format!(
                "Telegram API returned non-success status: {status}. Body: {error_body}"
            )));
        }

        Ok(())
    }
}
