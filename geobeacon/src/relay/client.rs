//! Collector client trait and HTTP implementation.
//!
//! The [`CollectorClient`] trait abstracts over the remote collector
//! endpoint, allowing the relay to work with any transport. The
//! [`HttpCollectorClient`] implementation POSTs JSON reports via `reqwest`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::position::PositionSample;

/// Default HTTP timeout for collector requests.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// One outbound report to the collector.
///
/// The wire contract: `{"latitude": <f64>, "longitude": <f64>, "token": <string>}`
/// with `token` omitted entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl LocationReport {
    /// Build a report from a captured sample and the token current at
    /// capture time.
    pub fn from_sample(sample: &PositionSample, token: Option<String>) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            token,
        }
    }
}

/// Errors that can occur when delivering a report.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The request could not be sent or the connection failed.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The collector answered with a non-success status.
    #[error("Collector returned status {status}")]
    Status { status: u16 },
}

/// Trait for delivering a report to the collector.
pub trait CollectorClient: Send + Sync {
    /// Deliver one report. A single attempt; the caller never retries.
    fn deliver(
        &self,
        report: &LocationReport,
    ) -> impl Future<Output = Result<(), CollectorError>> + Send;
}

/// A shared client forwards delivery to its inner client. This lets callers
/// retain a handle to the client (e.g. to inspect it) while the relay owns a
/// clone.
impl<C: CollectorClient> CollectorClient for Arc<C> {
    fn deliver(
        &self,
        report: &LocationReport,
    ) -> impl Future<Output = Result<(), CollectorError>> + Send {
        (**self).deliver(report)
    }
}

/// Configuration for the HTTP collector client.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Collector endpoint URL.
    pub endpoint: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl CollectorConfig {
    /// Create a config for an endpoint with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Collector client using direct HTTP requests.
///
/// Uses a reusable `reqwest::Client` with connection pooling and a request
/// timeout. Success is any 2xx status; the response body is ignored.
pub struct HttpCollectorClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCollectorClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::ClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &CollectorConfig) -> Result<Self, CollectorError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CollectorError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CollectorClient for HttpCollectorClient {
    async fn deliver(&self, report: &LocationReport) -> Result<(), CollectorError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .map_err(|e| CollectorError::Transport(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Collector response");

        if !status.is_success() {
            return Err(CollectorError::Status {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
