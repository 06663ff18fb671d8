use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hosts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    pub deleted_at: Option<ChronoDateTimeUtc>, // Soft delete marker
    pub name: String,
    pub ip: String,
    pub method_id: i32,
    pub is_pending: bool,
    pub alert_status: bool,
    pub interval: i32, // Minutes
    pub retry_count: i32,
    pub num_of_retry: i32,
    pub last_alert: Option<String>,
    pub last_normal: Option<String>,
    pub is_active: bool,
    pub last_checked_date: Option<ChronoDateTimeUtc>,
    pub alert_channel_name: String,
    pub expected_response: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub http_header: Option<String>, // JSON object of string pairs
    #[sea_orm(column_type = "Text", nullable)]
    pub http_body: Option<String>,
    pub device_type_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::check_config::Entity",
        from = "Column::MethodId",
        to = "super::check_config::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    CheckConfig,

    #[sea_orm(has_many = "super::host_history::Entity")]
    HostHistory,
}

impl Related<super::check_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckConfig.def()
    }
}

impl Related<super::host_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HostHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
