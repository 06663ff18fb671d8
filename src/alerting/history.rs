use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error};

use crate::db::models::{Host, HostHistory, HostStatus};
use crate::db::store::HostStore;

/// Appends transition events to the host history.
///
/// Writes are best-effort: a failed append is logged and the host's
/// in-memory state change stands.
pub struct HistoryRecorder {
    store: Arc<dyn HostStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn HostStore>) -> Self {
        Self { store }
    }

    /// Returns whether the row was written.
    pub async fn record(
        &self,
        host: &Host,
        status: HostStatus,
        alert_fired: bool,
        downtime_minutes: Option<f64>,
        at: DateTime<Utc>,
    ) -> bool {
        let entry = HostHistory {
            host_id: host.id,
            host_name: host.name.clone(),
            status,
            checked_at: at,
            device_type: host.device_type.clone(),
            alert_fired,
            down_minutes: downtime_minutes.filter(|m| *m >= 0.0),
        };

        match self.store.append_history(&entry).await {
            Ok(()) => {
                debug!(host_id = host.id, %status, "History entry recorded.");
                true
            }
            Err(e) => {
                error!(host_id = host.id, %status, error = %e, "Failed to append host history.");
                false
            }
        }
    }
}
