//! The HTTP transport boundary.
//!
//! The executor never talks to `reqwest` directly; it hands a fully built
//! [`HttpRequest`] to a [`Transport`]. [`ReqwestTransport`] is the default.
//! Tests and embedders can substitute their own implementation through
//! [`ClientBuilder::transport`](crate::ClientBuilder::transport).

use crate::{Error, ResponseEnvelope, Result};
use async_trait::async_trait;
use http::{HeaderMap, Method};
use std::time::Duration;
use url::Url;

/// Idle connections kept per host by the default transport.
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// How long an idle pooled connection is kept by the default transport.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// One physical HTTP request, built fresh for every attempt.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// Absolute URL including the encoded query.
    pub url: Url,
    /// Headers, including authentication.
    pub headers: HeaderMap,
    /// JSON body bytes, if any.
    pub body: Option<Vec<u8>>,
}

/// Sends HTTP requests on behalf of the client.
///
/// Implementations must be safe to share between concurrent operations.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use costops_client::transport::{HttpRequest, Transport};
/// use costops_client::{ResponseEnvelope, Result};
/// use http::{HeaderMap, StatusCode};
///
/// /// Answers every request with `{"status":"ok"}`.
/// struct AlwaysHealthy;
///
/// #[async_trait]
/// impl Transport for AlwaysHealthy {
///     async fn send(&self, _request: HttpRequest) -> Result<ResponseEnvelope> {
///         Ok(ResponseEnvelope::new(
///             StatusCode::OK,
///             HeaderMap::new(),
///             br#"{"status":"ok"}"#.to_vec(),
///         ))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one HTTP exchange.
    ///
    /// Connection-level failures should be reported as [`Error::Network`] or
    /// [`Error::Timeout`]; any response, whatever its status, is `Ok`.
    async fn send(&self, request: HttpRequest) -> Result<ResponseEnvelope>;

    /// Releases resources when the owning client is closed.
    fn close(&self) {}
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with connection pooling and a per-attempt timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<ResponseEnvelope> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ResponseEnvelope::new(status, headers, body.to_vec()))
    }
}
