//! Client configuration.
//!
//! A [`ClientBuilder`] starts from the defaults below, applies setters, and is
//! validated once in [`ClientBuilder::build`]. The resulting [`ClientConfig`] is
//! immutable for the lifetime of the client.

use crate::metrics::{MetricsCollector, NoopMetrics};
use crate::transport::{ReqwestTransport, Transport};
use crate::{Client, Error, Result, RetryPolicy};
use http::HeaderValue;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Production endpoint of the Cost Ops API.
pub const DEFAULT_BASE_URL: &str = "https://api.costops.example.com";

/// Per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Backoff delay after the first failed attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on a single backoff delay.
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Client-side request budget, in requests per second.
pub const DEFAULT_RATE_LIMIT: f64 = 100.0;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("llm-cost-ops-rust-sdk/", env!("CARGO_PKG_VERSION"));

const ENV_API_KEY: &str = "COSTOPS_API_KEY";
const ENV_BASE_URL: &str = "COSTOPS_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "COSTOPS_TIMEOUT_SECS";
const ENV_MAX_RETRIES: &str = "COSTOPS_MAX_RETRIES";
const ENV_RATE_LIMIT: &str = "COSTOPS_RATE_LIMIT";

/// Validated, immutable client settings.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    authorization: HeaderValue,
    user_agent: HeaderValue,
    timeout: Duration,
    retry_policy: RetryPolicy,
    rate_limit: f64,
    respect_retry_after: bool,
    transport: Arc<dyn Transport>,
    metrics: Arc<dyn MetricsCollector>,
}

impl ClientConfig {
    /// The resolved base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-attempt timeout applied by the default transport.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The backoff policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Requests per second admitted by the client-side rate limiter.
    pub fn rate_limit(&self) -> f64 {
        self.rate_limit
    }

    /// The `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        self.user_agent.to_str().unwrap_or(USER_AGENT)
    }

    /// Whether a 429 `Retry-After` hint can stretch the backoff delay.
    pub fn respect_retry_after(&self) -> bool {
        self.respect_retry_after
    }

    pub(crate) fn authorization(&self) -> &HeaderValue {
        &self.authorization
    }

    pub(crate) fn user_agent_header(&self) -> &HeaderValue {
        &self.user_agent
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn metrics(&self) -> &dyn MetricsCollector {
        self.metrics.as_ref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("user_agent", &self.user_agent())
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("rate_limit", &self.rate_limit)
            .field("respect_retry_after", &self.respect_retry_after)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use costops_client::Client;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), costops_client::Error> {
/// let client = Client::builder()
///     .api_key("sk-live-...")
///     .base_url("https://costops.internal.example.com")
///     .timeout(Duration::from_secs(10))
///     .max_retries(5)
///     .retry_delay(Duration::from_millis(250))
///     .rate_limit(20.0)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    retry_policy: RetryPolicy,
    rate_limit: f64,
    user_agent: String,
    respect_retry_after: bool,
    transport: Option<Arc<dyn Transport>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    env_errors: Vec<String>,
}

impl ClientBuilder {
    /// Creates a builder with the default settings.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy {
                max_retries: DEFAULT_MAX_RETRIES,
                base_delay: DEFAULT_RETRY_DELAY,
                max_delay: DEFAULT_MAX_RETRY_DELAY,
                jitter: true,
            },
            rate_limit: DEFAULT_RATE_LIMIT,
            user_agent: USER_AGENT.to_string(),
            respect_retry_after: true,
            transport: None,
            metrics: None,
            env_errors: Vec::new(),
        }
    }

    /// Creates a builder from `COSTOPS_*` environment variables.
    ///
    /// Reads `COSTOPS_API_KEY`, `COSTOPS_BASE_URL`, `COSTOPS_TIMEOUT_SECS`,
    /// `COSTOPS_MAX_RETRIES` and `COSTOPS_RATE_LIMIT`. Unset variables keep
    /// their defaults; unparsable ones make [`build`](Self::build) fail.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut builder = Self::new();

        if let Some(key) = lookup(ENV_API_KEY) {
            builder.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            builder.base_url = url;
        }
        if let Some(secs) = builder.parse_env::<f64>(&lookup, ENV_TIMEOUT_SECS) {
            match Duration::try_from_secs_f64(secs) {
                Ok(timeout) => builder.timeout = timeout,
                Err(_) => builder
                    .env_errors
                    .push(format!("{} must be a non-negative number of seconds", ENV_TIMEOUT_SECS)),
            }
        }
        if let Some(retries) = builder.parse_env::<usize>(&lookup, ENV_MAX_RETRIES) {
            builder.retry_policy.max_retries = retries;
        }
        if let Some(rate) = builder.parse_env::<f64>(&lookup, ENV_RATE_LIMIT) {
            builder.rate_limit = rate;
        }

        builder
    }

    fn parse_env<T: FromStr>(
        &mut self,
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
    ) -> Option<T> {
        let raw = lookup(name)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.env_errors
                    .push(format!("{} has an invalid value {:?}", name, raw));
                None
            }
        }
    }

    /// Sets the API base URL. Any path is kept as a prefix for every request.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the API key sent as a bearer token. Required.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many times a retryable failure is retried. `0` disables retries.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.retry_policy.max_retries = max_retries;
        self
    }

    /// Sets the backoff delay after the first failed attempt.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_policy.base_delay = delay;
        self
    }

    /// Sets the upper bound on a single backoff delay.
    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_policy.max_delay = delay;
        self
    }

    /// Enables or disables backoff jitter.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.retry_policy.jitter = jitter;
        self
    }

    /// Replaces the whole backoff policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the client-side rate limit in requests per second.
    pub fn rate_limit(mut self, requests_per_second: f64) -> Self {
        self.rate_limit = requests_per_second;
        self
    }

    /// Overrides the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Whether a 429 `Retry-After` hint may lengthen the backoff delay.
    /// Enabled by default. The hint is still capped by the max retry delay.
    pub fn respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = respect;
        self
    }

    /// Uses a custom transport instead of the pooled `reqwest` one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Reports per-attempt metrics to `metrics`. Defaults to [`NoopMetrics`].
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validates the settings and creates the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the API key is missing or blank, the
    /// base URL is not an absolute `http(s)` URL, the timeout is zero, the rate
    /// limit is not a positive finite number, the user agent is not a valid
    /// header value, or an environment variable could not be parsed. No
    /// transport is created in that case.
    pub fn build(self) -> Result<Client> {
        if let Some(problem) = self.env_errors.first() {
            return Err(Error::InvalidConfig(problem.clone()));
        }

        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::InvalidConfig("API key is required".to_string()))?;

        let base_url = parse_base_url(&self.base_url)?;

        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }

        if !self.rate_limit.is_finite() || self.rate_limit <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "rate limit must be a positive number of requests per second, got {}",
                self.rate_limit
            )));
        }

        let mut authorization = HeaderValue::try_from(format!("Bearer {}", api_key))
            .map_err(|_| Error::InvalidConfig("API key contains invalid characters".to_string()))?;
        authorization.set_sensitive(true);

        let user_agent = HeaderValue::try_from(self.user_agent.as_str())
            .map_err(|_| Error::InvalidConfig("user agent contains invalid characters".to_string()))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.timeout)?),
        };

        Ok(Client::from_config(ClientConfig {
            base_url,
            authorization,
            user_agent,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
            rate_limit: self.rate_limit,
            respect_retry_after: self.respect_retry_after,
            transport,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics)),
        }))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("rate_limit", &self.rate_limit)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::InvalidConfig(format!("invalid base URL {:?}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidConfig(format!(
            "base URL must use http or https, got {:?}",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(Error::InvalidConfig(format!(
            "base URL {:?} has no host",
            raw
        )));
    }

    Ok(url)
}
