//! Configuration for the batching proxy
//!
//! Settings are read once at process start from environment variables, validated, and then
//! treated as immutable for the lifetime of the process (the one exception being the active
//! [`Strategy`], which lives in its own atomically-guarded cell — see `proxy::strategy`).

use crate::error::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batch-formation ordering policy. See the scheduler module for `take_batch` semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Shortest-job-first: ascending `size`, earlier enqueue breaks ties.
    Sjf,
    /// Fair round-robin across tenants.
    Fair,
    /// First-come-first-served: strict enqueue order.
    Fcfs,
}

impl Strategy {
    /// Case-insensitive parse from the values accepted over the wire (`sjf`, `fair`, `fcfs`).
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "sjf" => Ok(Strategy::Sjf),
            "fair" => Ok(Strategy::Fair),
            "fcfs" => Ok(Strategy::Fcfs),
            other => Err(ProxyError::bad_request(format!(
                "unknown strategy '{other}', expected one of sjf|fair|fcfs"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sjf => "sjf",
            Strategy::Fair => "fair",
            Strategy::Fcfs => "fcfs",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level configuration for the proxy process
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Initial active strategy (`PROXY_STRATEGY`, default `fcfs`)
    pub initial_strategy: Strategy,

    /// Downstream classification endpoint (`DOWNSTREAM_URL`)
    pub downstream_url: String,

    /// Maximum tickets per batch, `B_MAX` (`MAX_BATCH`, default 5)
    pub max_batch: usize,

    /// HTTP bind address (`PROXY_BIND_ADDRESS`, default `0.0.0.0`)
    pub bind_address: String,

    /// HTTP port (`PROXY_PORT`, default 8080)
    pub port: u16,

    /// Optional downstream round-trip deadline (`DOWNSTREAM_TIMEOUT_MS`)
    pub downstream_timeout: Option<Duration>,
}

impl ProxyConfig {
    /// Load configuration from environment variables, applying documented defaults.
    pub fn from_env() -> Result<Self> {
        let initial_strategy = match std::env::var("PROXY_STRATEGY") {
            Ok(raw) if !raw.is_empty() => Strategy::parse(&raw)?,
            _ => Strategy::Fcfs,
        };

        let downstream_url = std::env::var("DOWNSTREAM_URL")
            .unwrap_or_else(|_| "http://localhost:8001/classify".to_string());

        let max_batch: usize = match std::env::var("MAX_BATCH") {
            Ok(raw) if !raw.is_empty() => raw
                .parse()
                .map_err(|_| ProxyError::bad_request(format!("invalid MAX_BATCH: '{raw}'")))?,
            _ => 5,
        };

        let bind_address =
            std::env::var("PROXY_BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port: u16 = match std::env::var("PROXY_PORT") {
            Ok(raw) if !raw.is_empty() => raw
                .parse()
                .map_err(|_| ProxyError::bad_request(format!("invalid PROXY_PORT: '{raw}'")))?,
            _ => 8080,
        };

        let downstream_timeout = match std::env::var("DOWNSTREAM_TIMEOUT_MS") {
            Ok(raw) if !raw.is_empty() => {
                let ms: u64 = raw.parse().map_err(|_| {
                    ProxyError::bad_request(format!("invalid DOWNSTREAM_TIMEOUT_MS: '{raw}'"))
                })?;
                Some(Duration::from_millis(ms))
            }
            _ => None,
        };

        let config = ProxyConfig {
            initial_strategy,
            downstream_url,
            max_batch,
            bind_address,
            port,
            downstream_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, rejecting anything that should be a fatal startup error.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch < 1 {
            return Err(ProxyError::bad_request(
                "MAX_BATCH must be >= 1".to_string(),
            ));
        }
        if self.downstream_url.is_empty() {
            return Err(ProxyError::bad_request(
                "DOWNSTREAM_URL must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
