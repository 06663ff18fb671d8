use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named notification target. The meaning of the `config*` columns depends
/// on the channel kind, which is derived from `name`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alert_channels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    pub deleted_at: Option<ChronoDateTimeUtc>,
    #[sea_orm(unique)]
    pub name: String,
    pub config1: String,
    pub config2: String,
    pub config3: String,
    pub config4: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
