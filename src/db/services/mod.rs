//! Data access for the host store tables, one sub-module per table group.
//! Everything here works on SeaORM entities; conversion into domain models
//! happens at the [`crate::db::store`] boundary.

pub mod channel_service;
pub mod history_service;
pub mod host_service;
