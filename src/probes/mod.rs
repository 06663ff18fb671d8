//! Reachability probes and the dispatcher that picks one per host.
//!
//! Every failure mode (transport, timeout, bad configuration) folds into an
//! unreachable [`Verdict`]; nothing here returns an error to the sweep.

use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::db::models::{Host, ProbeMethod};

pub mod http;
pub mod ping;

use http::HttpProbe;
use ping::{EchoTransport, PingProbe, SurgeEcho};

/// Extra time allowed on top of a probe's own timeout before the dispatcher
/// abandons it (covers DNS resolution and connection setup bookkeeping).
const PROBE_GRACE: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to resolve '{target}': {reason}")]
    Resolution { target: String, reason: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid probe configuration: {0}")]
    Configuration(String),
}

/// The outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub reachable: bool,
    pub detail: String,
}

impl Verdict {
    pub fn reachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: true,
            detail: detail.into(),
        }
    }

    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub http_timeout: Duration,
    pub ping_attempts: u32,
    pub ping_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(20),
            ping_attempts: 2,
            ping_timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, host: &Host, method: ProbeMethod) -> Verdict;
}

/// Selects the strategy for a host's method and bounds it with a hard timeout.
pub struct ProbeDispatcher<E = SurgeEcho> {
    ping: PingProbe<E>,
    http: HttpProbe,
    ping_budget: Duration,
    http_budget: Duration,
}

impl ProbeDispatcher<SurgeEcho> {
    pub fn new(settings: &ProbeSettings) -> Result<Self, ProbeError> {
        Self::with_echo(settings, SurgeEcho)
    }
}

impl<E: EchoTransport> ProbeDispatcher<E> {
    pub fn with_echo(settings: &ProbeSettings, echo: E) -> Result<Self, ProbeError> {
        let attempts = settings.ping_attempts.max(1);
        Ok(Self {
            ping: PingProbe::new(echo, attempts, settings.ping_timeout),
            http: HttpProbe::new(settings.http_timeout)?,
            ping_budget: settings.ping_timeout * attempts + PROBE_GRACE,
            http_budget: settings.http_timeout + PROBE_GRACE,
        })
    }
}

#[async_trait]
impl<E: EchoTransport> Prober for ProbeDispatcher<E> {
    async fn probe(&self, host: &Host, method: ProbeMethod) -> Verdict {
        let (budget, outcome) = match method {
            ProbeMethod::Ping => (
                self.ping_budget,
                timeout(self.ping_budget, self.ping.check(&host.address)).await,
            ),
            ProbeMethod::HttpGet => (
                self.http_budget,
                timeout(self.http_budget, self.http.check(host, Method::GET)).await,
            ),
            ProbeMethod::HttpPost => (
                self.http_budget,
                timeout(self.http_budget, self.http.check(host, Method::POST)).await,
            ),
        };

        let verdict = match outcome {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e @ ProbeError::Configuration(_))) => {
                warn!(host_id = host.id, %method, error = %e, "Probe configuration is invalid; treating host as unreachable.");
                Verdict::unreachable(e.to_string())
            }
            Ok(Err(e)) => Verdict::unreachable(e.to_string()),
            Err(_) => Verdict::unreachable(ProbeError::Timeout(budget).to_string()),
        };

        debug!(
            host_id = host.id,
            %method,
            reachable = verdict.reachable,
            detail = %verdict.detail,
            "Probe finished."
        );
        verdict
    }
}
