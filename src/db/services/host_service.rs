use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::db::entities::{check_config, host, prelude::*};
use crate::db::models::{format_store_timestamp, Host as MonitoredHost};
use crate::db::store::StoreError;

/// Fetches hosts that are active and not soft-deleted, ordered by id.
pub async fn get_active_hosts(db: &DatabaseConnection) -> Result<Vec<host::Model>, DbErr> {
    Host::find()
        .filter(host::Column::IsActive.eq(true))
        .filter(host::Column::DeletedAt.is_null())
        .order_by_asc(host::Column::Id)
        .all(db)
        .await
}

pub async fn get_check_method(
    db: &DatabaseConnection,
    method_id: i32,
) -> Result<Option<String>, DbErr> {
    Ok(CheckConfig::find_by_id(method_id)
        .one(db)
        .await?
        .map(|c: check_config::Model| c.method))
}

/// Writes only the fields the health state machine owns. Configuration
/// columns are left untouched so concurrent edits through the CRUD side
/// are not overwritten.
pub async fn update_host_runtime_fields(
    db: &DatabaseConnection,
    monitored: &MonitoredHost,
) -> Result<(), StoreError> {
    let active_host = host::ActiveModel {
        id: Set(monitored.id),
        is_pending: Set(monitored.is_pending),
        alert_status: Set(monitored.alert_fired),
        retry_count: Set(i32::try_from(monitored.retry_count).unwrap_or(i32::MAX)),
        last_alert: Set(monitored.last_alert_at.map(format_store_timestamp)),
        last_normal: Set(monitored.last_recovered_at.map(format_store_timestamp)),
        last_checked_date: Set(monitored.last_checked_at),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    match active_host.update(db).await {
        Ok(_) => Ok(()),
        Err(DbErr::RecordNotUpdated) => Err(StoreError::NotFound(format!("host {}", monitored.id))),
        Err(e) => Err(e.into()),
    }
}
