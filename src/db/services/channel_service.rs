use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::db::entities::{alert_channel, prelude::*};
use crate::db::store::StoreError;
use crate::notifications::models::{
    AlertChannel as ResolvedChannel, ChannelConfig, ChannelKind, DEFAULT_TELEGRAM_API_BASE,
};

pub async fn get_channel_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<alert_channel::Model>, DbErr> {
    AlertChannel::find()
        .filter(alert_channel::Column::Name.eq(name))
        .filter(alert_channel::Column::DeletedAt.is_null())
        .one(db)
        .await
}

/// Maps the generic `config1..config4` columns onto a typed channel config.
///
/// * telegram: `config1` API base (defaults to the public Bot API),
///   `config2` bot token, `config3` chat id
/// * mail: `config1` recipient
/// * hook / webhook: `config1` URL
pub fn into_alert_channel(model: alert_channel::Model) -> Result<ResolvedChannel, StoreError> {
    let kind = ChannelKind::from_channel_name(&model.name).ok_or_else(|| {
        StoreError::InvalidRecord(format!("alert channel '{}' has no known kind", model.name))
    })?;

    let config = match kind {
        ChannelKind::Telegram => {
            let api_base = if model.config1.trim().is_empty() {
                DEFAULT_TELEGRAM_API_BASE.to_string()
            } else {
                model.config1.trim().to_string()
            };
            ChannelConfig::Telegram {
                api_base,
                bot_token: model.config2.trim().to_string(),
                chat_id: model.config3.trim().to_string(),
            }
        }
        ChannelKind::Mail => ChannelConfig::Mail {
            recipient: model.config1,
        },
        ChannelKind::Webhook => ChannelConfig::Webhook { url: model.config1 },
    };

    Ok(ResolvedChannel {
        name: model.name,
        config,
    })
}
