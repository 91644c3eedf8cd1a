//! The Downstream Client: a stateless caller of the classification endpoint.

use proxy_common::error::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    sequences: &'a [Value],
}

#[derive(Deserialize)]
struct ClassifyResponse {
    results: Vec<Value>,
}

/// Stateless caller of the downstream classification endpoint. Holds a pooled `reqwest::Client`
/// and a configured URL/timeout; nothing about a single call is remembered afterwards.
pub struct DownstreamClient {
    client: reqwest::Client,
    url: String,
    timeout: Option<Duration>,
}

impl DownstreamClient {
    pub fn new(url: String, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ProxyError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// Send `items` as one batch, returning the downstream's results in the same order.
    ///
    /// Classifies every failure into one of `DownstreamTransport`, `DownstreamProtocol`, or
    /// `DownstreamTimeout`. The caller is responsible for reporting the same error to every
    /// ticket in the batch; this client has no notion of a "batch" beyond this one call.
    pub async fn classify(&self, items: &[Value]) -> Result<Vec<Value>> {
        let body = ClassifyRequest { sequences: items };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProxyError::downstream_timeout(format!("{} did not respond in time: {e}", self.url))
            } else {
                ProxyError::downstream_transport(format!("request to {} failed: {e}", self.url))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ProxyError::downstream_protocol(format!(
                "{} returned status {status}: {body_text}",
                self.url
            )));
        }

        let parsed: ClassifyResponse = response.json().await.map_err(|e| {
            ProxyError::downstream_protocol(format!("malformed response from {}: {e}", self.url))
        })?;

        if parsed.results.len() != items.len() {
            return Err(ProxyError::downstream_protocol(format!(
                "expected {} results, got {}",
                items.len(),
                parsed.results.len()
            )));
        }

        Ok(parsed.results)
    }
}
