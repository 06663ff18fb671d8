use async_trait::async_trait;
use rand::random;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, ICMP};

use super::{ProbeError, Verdict};

/// One ICMP echo round trip.
#[async_trait]
pub trait EchoTransport: Send + Sync + 'static {
    async fn echo(&self, addr: IpAddr, seq: u16, timeout: Duration) -> Result<Duration, ProbeError>;
}

/// [`EchoTransport`] backed by `surge-ping`.
pub struct SurgeEcho;

#[async_trait]
impl EchoTransport for SurgeEcho {
    async fn echo(&self, addr: IpAddr, seq: u16, timeout: Duration) -> Result<Duration, ProbeError> {
        let config = match addr {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config)
            .map_err(|e| ProbeError::Transport(format!("Failed to open ICMP socket: {e}")))?;
        let mut pinger = client.pinger(addr, PingIdentifier(random())).await;
        pinger.timeout(timeout);
        let (_reply, rtt) = pinger
            .ping(PingSequence(seq), &[])
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        Ok(rtt)
    }
}

/// Sends a fixed number of independent echoes; reachable iff any is answered.
pub struct PingProbe<E> {
    transport: E,
    attempts: u32,
    attempt_timeout: Duration,
}

impl<E: EchoTransport> PingProbe<E> {
    pub fn new(transport: E, attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            transport,
            attempts: attempts.max(1),
            attempt_timeout,
        }
    }

    pub async fn check(&self, address: &str) -> Result<Verdict, ProbeError> {
        let addr = resolve(address).await?;

        let mut replies = 0u32;
        let mut best_rtt: Option<Duration> = None;
        let mut last_error = None;
        for attempt in 0..self.attempts {
            let seq = u16::try_from(attempt).unwrap_or(u16::MAX);
            match self.transport.echo(addr, seq, self.attempt_timeout).await {
                Ok(rtt) => {
                    replies += 1;
                    best_rtt = Some(best_rtt.map_or(rtt, |best| best.min(rtt)));
                }
                Err(e) => last_error = Some(e),
            }
        }

        match (best_rtt, last_error) {
            (Some(rtt), _) => Ok(Verdict::reachable(format!(
                "{replies}/{} echo replies, best {} ms",
                self.attempts,
                rtt.as_millis()
            ))),
            (None, Some(e)) => Ok(Verdict::unreachable(format!(
                "0/{} echo replies: {e}",
                self.attempts
            ))),
            (None, None) => Ok(Verdict::unreachable("no echo attempts made")),
        }
    }
}

/// Resolves an IP literal or hostname to its first address.
pub async fn resolve(target: &str) -> Result<IpAddr, ProbeError> {
    let target = target.trim();
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host((target, 0))
        .await
        .map_err(|e| ProbeError::Resolution {
            target: target.to_string(),
            reason: e.to_string(),
        })?;
    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ProbeError::Resolution {
            target: target.to_string(),
            reason: "DNS resolution returned no addresses".to_string(),
        })
}
