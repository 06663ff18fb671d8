use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";

/// Delivery settings for each supported channel kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChannelConfig {
    /// Bot-style messaging. Messages go to `{api_base}{bot_token}/sendMessage`.
    Telegram {
        api_base: String,
        bot_token: String,
        chat_id: String,
    },
    Mail {
        recipient: String,
    },
    Webhook {
        url: String,
    },
}

impl ChannelConfig {
    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelConfig::Telegram { .. } => ChannelKind::Telegram,
            ChannelConfig::Mail { .. } => ChannelKind::Mail,
            ChannelConfig::Webhook { .. } => ChannelKind::Webhook,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Telegram,
    Mail,
    Webhook,
}

impl ChannelKind {
    /// Resolves the channel kind from a channel record name.
    pub fn from_channel_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "telegram" => Some(ChannelKind::Telegram),
            "mail" | "email" => Some(ChannelKind::Mail),
            "hook" | "webhook" => Some(ChannelKind::Webhook),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Mail => "mail",
            ChannelKind::Webhook => "webhook",
        };
        f.write_str(name)
    }
}

/// A named alert channel as resolved from the host store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertChannel {
    pub name: String,
    pub config: ChannelConfig,
}

/// Builds the human-readable alert text for a host edge transition.
pub fn format_alert_message(host_name: &str, address: &str, fired: bool) -> String {
    let state = if fired { "DOWN" } else { "UP" };
    format!("{host_name} ({address}) is {state}")
}
