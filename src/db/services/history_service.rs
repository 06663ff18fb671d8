use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::db::entities::host_history;
use crate::db::models::HostHistory;

/// Appends one history row. Rows are never updated afterwards.
pub async fn insert_history(
    db: &DatabaseConnection,
    entry: &HostHistory,
) -> Result<host_history::Model, DbErr> {
    let row = host_history::ActiveModel {
        host_id: Set(entry.host_id),
        host_name: Set(entry.host_name.clone()),
        status: Set(entry.status.as_str().to_string()),
        checked_at: Set(entry.checked_at),
        device_type: Set(entry.device_type.clone()),
        alert_status: Set(entry.alert_fired),
        down_duration: Set(entry.down_minutes),
        ..Default::default()
    };
    row.insert(db).await
}
