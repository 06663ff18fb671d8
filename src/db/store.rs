//! The narrow persistence boundary the monitor depends on.
//!
//! The scheduler and its components only see [`HostStore`]; the concrete
//! [`SeaOrmStore`] is injected at construction time.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;

use super::models::{Host, HostHistory};
use super::services::{channel_service, history_service, host_service};
use crate::notifications::models::AlertChannel;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

#[async_trait]
pub trait HostStore: Send + Sync {
    /// All active, non-deleted hosts.
    async fn list_active_hosts(&self) -> Result<Vec<Host>, StoreError>;

    /// Persists the runtime health fields of a host as a single-row update.
    async fn save_host(&self, host: &Host) -> Result<(), StoreError>;

    /// Resolves a check config id to its method name.
    async fn get_check_method(&self, method_id: i32) -> Result<String, StoreError>;

    /// Looks up an alert channel by name. `Ok(None)` when no channel matches.
    async fn get_alert_channel(&self, name: &str) -> Result<Option<AlertChannel>, StoreError>;

    async fn append_history(&self, entry: &HostHistory) -> Result<(), StoreError>;
}

/// [`HostStore`] backed by a SeaORM connection.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HostStore for SeaOrmStore {
    async fn list_active_hosts(&self) -> Result<Vec<Host>, StoreError> {
        let models = host_service::get_active_hosts(&self.db).await?;
        Ok(models.into_iter().map(Host::from).collect())
    }

    async fn save_host(&self, host: &Host) -> Result<(), StoreError> {
        host_service::update_host_runtime_fields(&self.db, host).await
    }

    async fn get_check_method(&self, method_id: i32) -> Result<String, StoreError> {
        host_service::get_check_method(&self.db, method_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("check config {method_id}")))
    }

    async fn get_alert_channel(&self, name: &str) -> Result<Option<AlertChannel>, StoreError> {
        match channel_service::get_channel_by_name(&self.db, name).await? {
            Some(model) => channel_service::into_alert_channel(model).map(Some),
            None => Ok(None),
        }
    }

    async fn append_history(&self, entry: &HostHistory) -> Result<(), StoreError> {
        history_service::insert_history(&self.db, entry).await?;
        Ok(())
    }
}
