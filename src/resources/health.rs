//! Service health probes.

use crate::models::HealthStatus;
use crate::{Client, RequestDescriptor, Result};
use http::Method;
use tokio_util::sync::CancellationToken;

/// Health operations, from [`Client::health`].
#[derive(Debug, Clone, Copy)]
pub struct Health<'a> {
    client: &'a Client,
}

impl<'a> Health<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Detailed health including dependency checks.
    pub async fn check(&self, cancel: &CancellationToken) -> Result<HealthStatus> {
        let request = RequestDescriptor::new(Method::GET, "/health");
        self.client.execute(cancel, request).await
    }

    /// Liveness probe. Succeeds on any 2xx.
    pub async fn live(&self, cancel: &CancellationToken) -> Result<()> {
        let request = RequestDescriptor::new(Method::GET, "/health/live");
        self.client.execute_empty(cancel, request).await
    }

    /// Readiness probe. Succeeds on any 2xx.
    pub async fn ready(&self, cancel: &CancellationToken) -> Result<()> {
        let request = RequestDescriptor::new(Method::GET, "/health/ready");
        self.client.execute_empty(cancel, request).await
    }
}
