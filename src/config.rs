//! Store and transport configuration.
//!
//! Both types deserialize with defaults for missing fields, so a host application can embed
//! them in its own config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::remote::RetryPolicy;

/// Collection path used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "/api/courses";

/// Settings for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Collection path; single records live at `<endpoint>/<id>`.
    pub endpoint: String,
    /// Retry policy for the initial load.
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Settings for the reqwest-backed transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    /// Scheme, host and port requests are sent to, e.g. `http://localhost:9000`.
    pub base_url: String,
    /// Per-request timeout in milliseconds; no timeout when absent.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
