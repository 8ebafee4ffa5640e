//! Upstream telemetry fetch.
//!
//! One invocation issues one HTTP GET against a satellite's configured
//! endpoint with a bounded request timeout and hands the body to the
//! normalizer. Every failure mode is converted into a [`FetchError`];
//! nothing propagates past this boundary, and there is no retry.

use std::time::Duration;

use serde_json::Value;

use sattrack_core::model::ObservedPosition;

use crate::normalize::{normalize, NormalizeError};

/// Tagged failure for one fetch attempt. The coordinator pairs this with
/// the satellite identity when logging and counting failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("fetch did not complete within {0}s")]
    TimedOut(u64),

    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Source of canonical positions for one endpoint. The HTTP implementation
/// is the only production source; tests substitute their own.
#[async_trait::async_trait]
pub trait PositionSource: Send + Sync {
    async fn fetch(&self, endpoint_url: &str) -> Result<ObservedPosition, FetchError>;
}

/// Fetches positions over HTTP with a shared connection-pooling client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PositionSource for HttpFetcher {
    async fn fetch(&self, endpoint_url: &str) -> Result<ObservedPosition, FetchError> {
        let response = self.client.get(endpoint_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body: Value = response.json().await?;
        Ok(normalize(&body)?)
    }
}
