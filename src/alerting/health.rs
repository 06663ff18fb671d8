//! Per-host health state machine with retry hysteresis.
//!
//! States are derived from the host's runtime flags:
//!
//! * `Healthy`: not alerting, no pending failures
//! * `Degraded`: failures accumulated below the retry threshold
//! * `Alerting`: the threshold was reached and a DOWN event was emitted
//!
//! Alerts are edge-triggered. Only the transition into `Alerting` and the
//! recovery out of it produce a [`HealthEvent`].

use chrono::{DateTime, Utc};

use crate::db::models::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Degraded,
    Alerting,
}

pub fn health_state(host: &Host) -> HealthState {
    if host.alert_fired {
        HealthState::Alerting
    } else if host.is_pending {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthEvent {
    /// The host reached its retry threshold.
    Down,
    /// The host answered again after an alert. `downtime_minutes` is absent
    /// when the alert stamp is missing or lies in the future.
    Up { downtime_minutes: Option<f64> },
}

/// Minutes between `alert_at` and `now`; `None` for a missing stamp or a
/// negative span.
pub fn downtime_minutes(alert_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<f64> {
    let elapsed = now.signed_duration_since(alert_at?);
    if elapsed < chrono::Duration::zero() {
        return None;
    }
    Some(elapsed.num_milliseconds() as f64 / 60_000.0)
}

/// Applies one probe verdict to `host` and returns the edge event, if any.
pub fn apply_verdict(host: &mut Host, reachable: bool, now: DateTime<Utc>) -> Option<HealthEvent> {
    host.last_checked_at = Some(now);

    if reachable {
        if host.alert_fired {
            let downtime = downtime_minutes(host.last_alert_at, now);
            host.alert_fired = false;
            host.retry_count = 0;
            host.is_pending = false;
            host.last_recovered_at = Some(now);
            return Some(HealthEvent::Up {
                downtime_minutes: downtime,
            });
        }
        // Failures below the threshold clear silently.
        host.is_pending = false;
        return None;
    }

    host.retry_count = host.retry_count.saturating_add(1);
    host.is_pending = true;

    if host.retry_count >= host.effective_retry_threshold() && !host.alert_fired {
        host.alert_fired = true;
        host.is_pending = false;
        host.last_alert_at = Some(now);
        return Some(HealthEvent::Down);
    }
    None
}
