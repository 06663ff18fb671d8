//! Domain models the monitor works with.
//!
//! Rows from the host store are converted into these types once, at load time.
//! Serialized payloads (header JSON, text timestamps) only exist at the
//! persistence boundary.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use super::entities::host;

/// Text format used by the host store for `last_alert` / `last_normal`.
/// Values are always written and read as UTC.
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_EXPECTED_STATUS: i32 = 200;

/// The closed set of probe methods a check config can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeMethod {
    Ping,
    HttpGet,
    HttpPost,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown check method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for ProbeMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ping" => Ok(ProbeMethod::Ping),
            "http_get" | "http-get" => Ok(ProbeMethod::HttpGet),
            "http_post" | "http-post" => Ok(ProbeMethod::HttpPost),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeMethod::Ping => "ping",
            ProbeMethod::HttpGet => "http_get",
            ProbeMethod::HttpPost => "http_post",
        };
        f.write_str(name)
    }
}

pub type HeaderPairs = BTreeMap<String, String>;

/// Host-specific parameters for HTTP probes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeParams {
    /// Parsed header configuration. A malformed payload is kept as an error
    /// message so the probe can fail (and log) instead of the load.
    pub headers: Result<HeaderPairs, String>,
    pub body: Option<String>,
    pub expected_status: Option<i32>,
}

impl Default for ProbeParams {
    fn default() -> Self {
        Self {
            headers: Ok(HeaderPairs::new()),
            body: None,
            expected_status: None,
        }
    }
}

impl ProbeParams {
    pub fn expected_status(&self) -> i32 {
        self.expected_status.unwrap_or(DEFAULT_EXPECTED_STATUS)
    }
}

/// Parses the stored header payload, a JSON object with string values.
/// A missing or blank payload means "no headers".
pub fn parse_headers(raw: Option<&str>) -> Result<HeaderPairs, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(HeaderPairs::new()),
        Some(payload) => serde_json::from_str::<HeaderPairs>(payload)
            .map_err(|e| format!("Failed to parse headers: {e}")),
    }
}

/// Parses a stored timestamp. Accepts the store's own text format and RFC 3339.
pub fn parse_store_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, STORE_TIMESTAMP_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_store_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(STORE_TIMESTAMP_FORMAT).to_string()
}

/// A monitored endpoint together with its runtime health fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub method_id: i32,
    pub params: ProbeParams,
    pub interval: Duration,
    pub is_active: bool,
    pub alert_channel: String,
    pub device_type: Option<String>,

    pub is_pending: bool,
    pub alert_fired: bool,
    pub retry_count: u32,
    /// Raw configured threshold; see [`Host::effective_retry_threshold`].
    pub retry_threshold: i32,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_alert_at: Option<DateTime<Utc>>,
    pub last_recovered_at: Option<DateTime<Utc>>,
}

impl Host {
    /// A non-positive threshold would never alert, so it is treated as 1.
    pub fn effective_retry_threshold(&self) -> u32 {
        u32::try_from(self.retry_threshold).unwrap_or(0).max(1)
    }
}

fn load_timestamp(host_id: i32, field: &'static str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = parse_store_timestamp(raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        warn!(host_id, field, value = raw, "Unparseable timestamp in host record; treating as absent.");
    }
    parsed
}

impl From<host::Model> for Host {
    fn from(model: host::Model) -> Self {
        let headers = parse_headers(model.http_header.as_deref());
        if let Err(e) = &headers {
            warn!(host_id = model.id, error = %e, "Host has malformed header configuration.");
        }

        Host {
            id: model.id,
            last_alert_at: load_timestamp(model.id, "last_alert", model.last_alert.as_deref()),
            last_recovered_at: load_timestamp(model.id, "last_normal", model.last_normal.as_deref()),
            name: model.name,
            address: model.ip,
            method_id: model.method_id,
            params: ProbeParams {
                headers,
                body: model.http_body,
                expected_status: model.expected_response,
            },
            interval: Duration::minutes(i64::from(model.interval)),
            is_active: model.is_active,
            alert_channel: model.alert_channel_name,
            device_type: model.device_type_name,
            is_pending: model.is_pending,
            alert_fired: model.alert_status,
            retry_count: u32::try_from(model.retry_count).unwrap_or(0),
            retry_threshold: model.num_of_retry,
            last_checked_at: model.last_checked_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    Up,
    Down,
}

impl HostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostStatus::Up => "up",
            HostStatus::Down => "down",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable state-transition event.
#[derive(Debug, Clone, PartialEq)]
pub struct HostHistory {
    pub host_id: i32,
    pub host_name: String,
    pub status: HostStatus,
    pub checked_at: DateTime<Utc>,
    pub device_type: Option<String>,
    pub alert_fired: bool,
    pub down_minutes: Option<f64>,
}
