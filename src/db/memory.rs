//! In-memory [`HostStore`] used by unit tests.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Mutex;

use super::models::{Host, HostHistory, ProbeParams};
use super::store::{HostStore, StoreError};
use crate::notifications::models::AlertChannel;

#[derive(Default)]
pub struct MemoryStore {
    hosts: Mutex<Vec<Host>>,
    methods: Mutex<HashMap<i32, String>>,
    channels: Mutex<Vec<AlertChannel>>,
    history: Mutex<Vec<HostHistory>>,
    saves: Mutex<usize>,
    fail_saves: Mutex<bool>,
    fail_history: Mutex<bool>,
    fail_listing: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        {
            let mut methods = store.methods.lock().unwrap();
            methods.insert(1, "http_post".to_string());
            methods.insert(2, "http_get".to_string());
            methods.insert(3, "ping".to_string());
        }
        store
    }

    pub fn add_host(&self, host: Host) {
        self.hosts.lock().unwrap().push(host);
    }

    pub fn add_method(&self, id: i32, name: &str) {
        self.methods.lock().unwrap().insert(id, name.to_string());
    }

    pub fn add_channel(&self, channel: AlertChannel) {
        self.channels.lock().unwrap().push(channel);
    }

    pub fn host(&self, id: i32) -> Host {
        self.hosts
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .expect("host exists")
    }

    pub fn history(&self) -> Vec<HostHistory> {
        self.history.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap() = fail;
    }

    pub fn fail_history(&self, fail: bool) {
        *self.fail_history.lock().unwrap() = fail;
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }
}

#[async_trait]
impl HostStore for MemoryStore {
    async fn list_active_hosts(&self) -> Result<Vec<Host>, StoreError> {
        if *self.fail_listing.lock().unwrap() {
            return Err(StoreError::InvalidRecord("listing disabled".to_string()));
        }
        Ok(self
            .hosts
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.is_active)
            .cloned()
            .collect())
    }

    async fn save_host(&self, host: &Host) -> Result<(), StoreError> {
        if *self.fail_saves.lock().unwrap() {
            return Err(StoreError::InvalidRecord("saves disabled".to_string()));
        }
        *self.saves.lock().unwrap() += 1;
        let mut hosts = self.hosts.lock().unwrap();
        match hosts.iter_mut().find(|h| h.id == host.id) {
            Some(slot) => {
                *slot = host.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("host {}", host.id))),
        }
    }

    async fn get_check_method(&self, method_id: i32) -> Result<String, StoreError> {
        self.methods
            .lock()
            .unwrap()
            .get(&method_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("check config {method_id}")))
    }

    async fn get_alert_channel(&self, name: &str) -> Result<Option<AlertChannel>, StoreError> {
        Ok(self
            .channels
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn append_history(&self, entry: &HostHistory) -> Result<(), StoreError> {
        if *self.fail_history.lock().unwrap() {
            return Err(StoreError::InvalidRecord("history disabled".to_string()));
        }
        self.history.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// A healthy, never-checked host with sensible test defaults.
pub fn test_host(id: i32, method_id: i32, address: &str) -> Host {
    Host {
        id,
        name: format!("host-{id}"),
        address: address.to_string(),
        method_id,
        params: ProbeParams::default(),
        interval: Duration::minutes(1),
        is_active: true,
        alert_channel: "telegram".to_string(),
        device_type: Some("Server".to_string()),
        is_pending: false,
        alert_fired: false,
        retry_count: 0,
        retry_threshold: 3,
        last_checked_at: None,
        last_alert_at: None,
        last_recovered_at: None,
    }
}
