//! HTTP transport backed by reqwest.
//!
//! Requires the `http` feature.
//!
//! ## Example
//!
//! ```ignore
//! use reactive_store::{remote::HttpTransport, Course, Store};
//!
//! let transport = HttpTransport::new("http://localhost:9000")?;
//! let store: Store<Course, _> = Store::new(transport);
//! store.init().await?;
//! ```

use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use super::{Transport, TransportError};
use crate::config::HttpTransportConfig;

/// [`Transport`] issuing real HTTP requests against `base_url`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Transport with a default client.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::from_config(&HttpTransportConfig::new(base_url))
    }

    /// Transport with a client built from `config`.
    pub fn from_config(config: &HttpTransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| TransportError::Request {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Transport reusing an existing client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn send_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TransportError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| send_error(&url, e))?;
        let response = check_status(&url, response)?;

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { url: url.clone() }
            } else {
                TransportError::Body {
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        })
    }

    async fn put(&self, path: &str, body: Value) -> Result<(), TransportError> {
        let url = self.url(path);
        debug!(%url, "PUT");

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(&url, e))?;
        check_status(&url, response)?;
        Ok(())
    }
}
