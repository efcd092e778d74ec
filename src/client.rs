//! The Cost Ops client and its request executor.
//!
//! [`Client`] is the entry point: resource modules borrow it, build a
//! [`RequestDescriptor`] and hand it to one of the `execute*` methods, which
//! apply rate limiting, retries with backoff, cancellation and error
//! classification.

use crate::classify::classify;
use crate::config::{ClientBuilder, ClientConfig};
use crate::lifecycle::Lifecycle;
use crate::metrics::AttemptOutcome;
use crate::rate_limit::RateLimiter;
use crate::resources::{Costs, Export, Health, Pricing, Usage};
use crate::transport::HttpRequest;
use crate::{Error, RequestDescriptor, ResponseEnvelope, Result};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A client for the Cost Ops API.
///
/// Cheap to clone; clones share the connection pool, the rate limiter and the
/// open/closed state. Safe to use from many tasks at once.
///
/// # Examples
///
/// ```no_run
/// use costops_client::{CancellationToken, Client};
///
/// # async fn example() -> Result<(), costops_client::Error> {
/// let client = Client::builder().api_key("sk-live-...").build()?;
/// let cancel = CancellationToken::new();
///
/// let health = client.health().check(&cancel).await?;
/// println!("service is {:?}", health.status);
///
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    rate_limiter: RateLimiter,
    lifecycle: Lifecycle,
}

impl Client {
    /// Creates a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_config(config: ClientConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit());
        Self {
            inner: Arc::new(ClientInner {
                config,
                rate_limiter,
                lifecycle: Lifecycle::new(),
            }),
        }
    }

    /// The validated configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The client-side rate limiter shared by all clones.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.rate_limiter
    }

    /// Returns `true` once [`close`](Self::close) has been called on any clone.
    pub fn is_closed(&self) -> bool {
        self.inner.lifecycle.is_closed()
    }

    /// Closes the client and releases the transport.
    ///
    /// Idempotent. Every later call, and every retry of a call already in
    /// flight, fails with [`Error::Closed`]. Calls waiting for a rate limit
    /// token or sleeping between attempts are woken immediately; an attempt
    /// already on the wire is allowed to finish.
    pub fn close(&self) {
        if self.inner.lifecycle.close() {
            tracing::debug!("Closing Cost Ops client");
            self.inner.config.transport().close();
        }
    }

    /// Pricing tables.
    pub fn pricing(&self) -> Pricing<'_> {
        Pricing::new(self)
    }

    /// Usage records and statistics.
    pub fn usage(&self) -> Usage<'_> {
        Usage::new(self)
    }

    /// Cost records, summaries and analytics.
    pub fn costs(&self) -> Costs<'_> {
        Costs::new(self)
    }

    /// Data exports and scheduled reports.
    pub fn export(&self) -> Export<'_> {
        Export::new(self)
    }

    /// Service health probes.
    pub fn health(&self) -> Health<'_> {
        Health::new(self)
    }

    /// Executes a request and decodes the JSON response into `T`.
    ///
    /// An empty success body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// Any [`Error`]; see [`execute_raw`](Self::execute_raw). A body that does not
    /// match `T` yields [`Error::Decode`], which is never retried.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use costops_client::{CancellationToken, Client, RequestDescriptor};
    /// use http::Method;
    ///
    /// # async fn example(client: Client) -> Result<(), costops_client::Error> {
    /// let request = RequestDescriptor::new(Method::GET, "/api/v1/usage/stats")
    ///     .with_query_param("group_by", "provider");
    /// let stats: serde_json::Value = client.execute(&CancellationToken::new(), request).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<T>(&self, cancel: &CancellationToken, request: RequestDescriptor) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let operation = operation_name(&request);
        let response = self.send(cancel, &request, &operation).await?;

        response.json().map_err(|e| {
            tracing::error!(
                error = %e,
                operation = %operation,
                "Failed to decode response"
            );
            self.record_error(&operation, &e);
            e
        })
    }

    /// Executes a request whose response body is not needed.
    pub async fn execute_empty(
        &self,
        cancel: &CancellationToken,
        request: RequestDescriptor,
    ) -> Result<()> {
        let operation = operation_name(&request);
        self.send(cancel, &request, &operation).await.map(|_| ())
    }

    /// Executes a request and returns the raw 2xx response.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] if the client is closed before or between attempts.
    /// - [`Error::Canceled`] if `cancel` fires while waiting for a rate limit
    ///   token, during an attempt, or during a backoff sleep.
    /// - The classified error for a non-retryable response.
    /// - [`Error::RetriesExhausted`] when the last permitted attempt failed
    ///   with a retryable error.
    pub async fn execute_raw(
        &self,
        cancel: &CancellationToken,
        request: RequestDescriptor,
    ) -> Result<ResponseEnvelope> {
        let operation = operation_name(&request);
        self.send(cancel, &request, &operation).await
    }

    async fn send(
        &self,
        cancel: &CancellationToken,
        request: &RequestDescriptor,
        operation: &str,
    ) -> Result<ResponseEnvelope> {
        self.send_with_retry(cancel, request, operation)
            .await
            .map_err(|e| {
                match &e {
                    Error::Canceled => {
                        tracing::debug!(operation = %operation, "Request canceled");
                        self.record_error(operation, &e);
                    }
                    Error::Closed => self.record_error(operation, &e),
                    _ => {}
                }
                e
            })
    }

    async fn send_with_retry(
        &self,
        cancel: &CancellationToken,
        request: &RequestDescriptor,
        operation: &str,
    ) -> Result<ResponseEnvelope> {
        let inner = &self.inner;
        inner.lifecycle.ensure_open()?;

        let url = request.url(inner.config.base_url()).map_err(|e| {
            self.record_error(operation, &e);
            e
        })?;
        let policy = inner.config.retry_policy();

        tokio::select! {
            biased;
            _ = inner.lifecycle.closed() => return Err(Error::Closed),
            acquired = inner.rate_limiter.acquire(cancel) => acquired?,
        }

        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Canceled);
            }
            inner.lifecycle.ensure_open()?;

            tracing::trace!(
                method = %request.method,
                url = %url,
                attempt = attempt + 1,
                "Dispatching request"
            );

            let http_request = self.http_request(request, url.clone());
            let started = Instant::now();

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.record_request(&request.method, AttemptOutcome::Canceled, started.elapsed());
                    return Err(Error::Canceled);
                }
                result = inner.config.transport().send(http_request) => result,
            };

            let error = match result {
                Ok(response) => {
                    self.record_request(
                        &request.method,
                        AttemptOutcome::Status(response.status),
                        started.elapsed(),
                    );
                    match classify(&response) {
                        None => return Ok(response),
                        Some(error) => error,
                    }
                }
                Err(error) => {
                    self.record_request(&request.method, AttemptOutcome::Failed, started.elapsed());
                    error
                }
            };

            self.record_error(operation, &error);

            if !error.is_retryable() {
                tracing::error!(
                    error = %error,
                    operation = %operation,
                    attempt = attempt + 1,
                    "Request failed"
                );
                return Err(error);
            }

            let Some(backoff) = policy.delay_for_attempt(attempt) else {
                let error = Error::RetriesExhausted {
                    attempts: attempt + 1,
                    last_error: Box::new(error),
                };
                tracing::error!(
                    error = %error,
                    operation = %operation,
                    "Giving up after retries"
                );
                self.record_error(operation, &error);
                return Err(error);
            };

            let delay = self.retry_delay(backoff, &error);

            tracing::warn!(
                error = %error,
                operation = %operation,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "Retrying request after delay"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Canceled),
                _ = inner.lifecycle.closed() => return Err(Error::Closed),
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    /// Backoff delay, stretched to a 429 `Retry-After` hint when allowed.
    fn retry_delay(&self, backoff: Duration, error: &Error) -> Duration {
        let config = &self.inner.config;
        if !config.respect_retry_after() {
            return backoff;
        }

        match error.rate_limit_delay(config.retry_policy().max_delay) {
            Some(hint) => backoff.max(hint),
            None => backoff,
        }
    }

    fn http_request(&self, request: &RequestDescriptor, url: Url) -> HttpRequest {
        let config = &self.inner.config;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.extend(request.headers.clone());
        headers.insert(AUTHORIZATION, config.authorization().clone());
        headers.insert(USER_AGENT, config.user_agent_header().clone());

        let body = request.body().map(<[u8]>::to_vec);
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        HttpRequest {
            method: request.method.clone(),
            url,
            headers,
            body,
        }
    }

    fn record_request(&self, method: &Method, outcome: AttemptOutcome, duration: Duration) {
        self.inner
            .config
            .metrics()
            .record_request(method, outcome, duration);
    }

    fn record_error(&self, operation: &str, error: &Error) {
        self.inner.config.metrics().record_error(operation, error);
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn operation_name(request: &RequestDescriptor) -> String {
    format!("{} {}", request.method, request.path())
}
