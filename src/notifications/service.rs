use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use super::models::{format_alert_message, ChannelConfig, ChannelKind};
use super::senders::{telegram::TelegramSender, NotificationSender, SenderError};
use crate::db::models::Host;
use crate::db::store::{HostStore, StoreError};

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Alert channel not found: {0}")]
    ChannelNotFound(String),
    #[error("Channel kind '{0}' is not implemented yet")]
    UnsupportedChannel(ChannelKind),
    #[error("Sender error: {0}")]
    SenderError(#[from] SenderError),
}

/// What happened to a single notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    /// No channel configured or no channel matched the host's reference.
    Skipped,
    Failed,
}

/// Delivers edge-transition alerts to the host's named channel.
///
/// Every attempt is one-shot: failures are logged and reported through
/// [`NotifyOutcome`], never retried and never propagated.
pub struct AlertNotifier {
    store: Arc<dyn HostStore>,
    telegram: Arc<dyn NotificationSender>,
}

impl AlertNotifier {
    pub fn new(store: Arc<dyn HostStore>, timeout: Duration) -> Result<Self, SenderError> {
        let telegram = TelegramSender::new(timeout)?;
        Ok(Self::with_sender(store, Arc::new(telegram)))
    }

    pub fn with_sender(store: Arc<dyn HostStore>, telegram: Arc<dyn NotificationSender>) -> Self {
        Self { store, telegram }
    }

    /// Resolves `channel_name` and sends `message` through it.
    pub async fn send_to_channel(
        &self,
        channel_name: &str,
        message: &str,
    ) -> Result<(), NotificationError> {
        let channel = self
            .store
            .get_alert_channel(channel_name)
            .await?
            .ok_or_else(|| NotificationError::ChannelNotFound(channel_name.to_string()))?;

        match &channel.config {
            ChannelConfig::Telegram { .. } => {
                self.telegram.send(&channel.config, message).await?;
                Ok(())
            }
            ChannelConfig::Mail { .. } | ChannelConfig::Webhook { .. } => {
                Err(NotificationError::UnsupportedChannel(channel.config.kind()))
            }
        }
    }

    /// Sends the DOWN (`fired = true`) or UP message for `host`.
    pub async fn notify(&self, host: &Host, fired: bool) -> NotifyOutcome {
        if host.alert_channel.trim().is_empty() {
            info!(host_id = host.id, "Host has no alert channel configured; skipping notification.");
            return NotifyOutcome::Skipped;
        }

        let message = format_alert_message(&host.name, &host.address, fired);
        match self.send_to_channel(&host.alert_channel, &message).await {
            Ok(()) => {
                info!(host_id = host.id, channel = %host.alert_channel, fired, "Alert notification delivered.");
                NotifyOutcome::Delivered
            }
            Err(NotificationError::ChannelNotFound(name)) => {
                warn!(host_id = host.id, channel = %name, "No alert channel matches; notification skipped.");
                NotifyOutcome::Skipped
            }
            Err(e @ NotificationError::UnsupportedChannel(_)) => {
                warn!(host_id = host.id, channel = %host.alert_channel, error = %e, "Alert notification not delivered.");
                NotifyOutcome::Failed
            }
            Err(e) => {
                error!(host_id = host.id, channel = %host.alert_channel, error = %e, "Failed to deliver alert notification.");
                NotifyOutcome::Failed
            }
        }
    }
}
