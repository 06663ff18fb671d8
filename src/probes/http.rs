use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::time::Duration;

use super::{ProbeError, Verdict};
use crate::db::models::{HeaderPairs, Host};

/// HTTP GET/POST probe. Reachable iff the response status equals the host's
/// expected status.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub async fn check(&self, host: &Host, method: Method) -> Result<Verdict, ProbeError> {
        let pairs = host
            .params
            .headers
            .as_ref()
            .map_err(|e| ProbeError::Configuration(e.clone()))?;
        let headers = build_header_map(pairs)?;

        let mut request = self
            .client
            .request(method.clone(), host.address.as_str())
            .headers(headers);
        if method == Method::POST {
            request = request.body(host.params.body.clone().unwrap_or_default());
        }

        let response = request.send().await.map_err(classify_error)?;
        let status = response.status();
        // Drain the body so the connection can be reused; its content is irrelevant.
        let _ = response.bytes().await;

        let expected = host.params.expected_status();
        if i32::from(status.as_u16()) == expected {
            Ok(Verdict::reachable(format!("HTTP {}", status.as_u16())))
        } else {
            Ok(Verdict::unreachable(format!(
                "HTTP {}, expected {expected}",
                status.as_u16()
            )))
        }
    }
}

pub fn build_header_map(pairs: &HeaderPairs) -> Result<HeaderMap, ProbeError> {
    let mut header_map = HeaderMap::new();
    for (key, value) in pairs {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ProbeError::Configuration(format!("Invalid header name '{key}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ProbeError::Configuration(format!("Invalid header value for '{key}': {e}")))?;
        header_map.insert(name, value);
    }
    Ok(header_map)
}

fn classify_error(e: reqwest::Error) -> ProbeError {
    if e.is_builder() {
        ProbeError::Configuration(format!("Invalid request: {e}"))
    } else if e.is_timeout() {
        ProbeError::Transport("Request timed out".to_string())
    } else {
        ProbeError::Transport(e.to_string())
    }
}
