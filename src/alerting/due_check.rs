//! Decides which hosts a sweep should probe.

use chrono::{DateTime, Duration, Utc};

use crate::db::models::Host;

/// Forward skew added to "now" so a host whose interval equals the sweep
/// period is not skipped by a few milliseconds of timer jitter.
pub const DEFAULT_DUE_SKEW_SECS: i64 = 5;

/// True iff the host was never checked or more than `interval` has elapsed
/// since `last_checked_at`.
pub fn should_check(
    last_checked_at: Option<DateTime<Utc>>,
    interval: Duration,
    now: DateTime<Utc>,
) -> bool {
    match last_checked_at {
        None => true,
        Some(last) => now.signed_duration_since(last) > interval,
    }
}

/// [`should_check`] for a host, with `skew` applied to `now`.
pub fn is_due(host: &Host, now: DateTime<Utc>, skew: Duration) -> bool {
    should_check(host.last_checked_at, host.interval, now + skew)
}
