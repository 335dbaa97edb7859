//! Collector HTTP client
//!
//! Sends each [`UploadRequest`] as one `POST <endpoint>?mode=<kind>` with a
//! plain-text body and reports back the status code and body. No retries:
//! the uploader decides what an unacknowledged request means.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use crashbox_core::ports::{ITransport, UploadRequest};
//! use crashbox_http::client::CollectorClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = CollectorClient::new("https://collector.crashbox.dev/submit", Duration::from_secs(15))?;
//! let response = client.send(UploadRequest::heartbeat("apiKey:tenant-42\n")).await?;
//! println!("collector answered {}", response.status);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use crashbox_core::config::CollectorConfig;
use crashbox_core::ports::{ITransport, TransportResponse, UploadRequest};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::CollectorError;

/// Content type of every request body
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// HTTP client for the collector endpoint
#[derive(Debug, Clone)]
pub struct CollectorClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl CollectorClient {
    /// Creates a client posting to `endpoint`, each request bounded by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CollectorError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(CollectorError::InvalidEndpoint(endpoint));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("crashbox/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Creates a client from the `collector` config section.
    pub fn from_config(config: &CollectorConfig) -> Result<Self, CollectorError> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl ITransport for CollectorClient {
    #[instrument(skip(self, request), fields(mode = request.kind.mode(), bytes = request.body.len()))]
    async fn send(&self, request: UploadRequest) -> Result<TransportResponse> {
        let kind = request.kind;

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("mode", kind.mode())])
            .header(CONTENT_TYPE, TEXT_PLAIN_UTF8)
            .body(request.body)
            .send()
            .await
            .with_context(|| format!("Failed to send {kind} request to {}", self.endpoint))?;

        let status = response.status().as_u16();
        // The status alone decides acknowledgement; the body is advisory
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status, error = %e, "Ignoring unreadable collector response body");
                String::new()
            }
        };

        debug!(status, body_len = body.len(), "Collector responded");
        Ok(TransportResponse::new(status, body))
    }
}
