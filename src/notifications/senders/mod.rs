use async_trait::async_trait;
use thiserror::Error;

use super::models::ChannelConfig;

pub mod telegram;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// A trait for delivering a message to one channel kind.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Performs a single delivery attempt. Implementations must not retry.
    async fn send(&self, config: &ChannelConfig, message: &str) -> Result<(), SenderError>;
}
