//! HTTP-probed dependency.
//!
//! The service handle the CLI registers for every `[[dependencies]]` entry in
//! the config file. Initialization and health checks are both a `GET` against
//! the configured URL; any 2xx counts as up.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::error::BoxError;
use crate::registry::entry::{HealthCheck, ServiceHandle};

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// A remote dependency reachable over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    name: String,
    url: Url,
    client: reqwest::Client,
}

impl HttpEndpoint {
    pub fn new(name: impl Into<String>, url: Url, timeout: Duration) -> Result<Self, EndpointError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: name.into(),
            url,
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// One `GET` against the endpoint.
    pub async fn probe(&self) -> Result<(), EndpointError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EndpointError::Status(status.as_u16()));
        }
        Ok(())
    }

    /// Health check bound to this endpoint.
    pub fn health_check(self: &Arc<Self>) -> HealthCheck {
        let endpoint = Arc::clone(self);
        HealthCheck::new(move || {
            let endpoint = Arc::clone(&endpoint);
            async move { endpoint.probe().await }
        })
    }
}

#[async_trait]
impl ServiceHandle for HttpEndpoint {
    async fn initialize(&self) -> Result<(), BoxError> {
        tracing::debug!(dependency = %self.name, url = %self.url, "Probing endpoint");
        self.probe().await.map_err(Into::into)
    }
}
