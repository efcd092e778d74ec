//! Client-side admission control and server rate limit hints.
//!
//! [`RateLimiter`] is a token bucket that paces outbound requests to the
//! configured requests-per-second. [`RateLimitInfo`] carries the hints a 429
//! response gives about when to come back.

use crate::{Error, Result};
use http::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// Absorbs float drift so a waiter that slept exactly long enough is admitted.
const TOKEN_EPSILON: f64 = 1e-9;

/// A token bucket with burst capacity equal to one second's allowance.
///
/// Waiters queue on a FIFO mutex, so tokens are handed out first-requested,
/// first-served. A waiter that is cancelled leaves the queue without consuming
/// a token.
///
/// # Examples
///
/// ```
/// use costops_client::rate_limit::RateLimiter;
/// use costops_client::CancellationToken;
///
/// # async fn example() -> Result<(), costops_client::Error> {
/// let limiter = RateLimiter::new(10.0);
/// let cancel = CancellationToken::new();
///
/// limiter.acquire(&cancel).await?;
/// assert!(limiter.try_acquire());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, rate: f64, capacity: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }

    fn take(&mut self) -> bool {
        if self.tokens + TOKEN_EPSILON >= 1.0 {
            self.tokens = (self.tokens - 1.0).max(0.0);
            true
        } else {
            false
        }
    }
}

impl RateLimiter {
    /// Creates a full bucket refilling at `requests_per_second`.
    ///
    /// The capacity is never below one token, so fractional rates still admit
    /// requests.
    pub fn new(requests_per_second: f64) -> Self {
        let capacity = requests_per_second.max(1.0);
        Self {
            rate: requests_per_second,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// The configured refill rate in requests per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// The burst capacity in tokens.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Waits for a token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Canceled`] if `cancel` fires first; no token is consumed
    /// in that case.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Canceled);
        }

        let mut state = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Canceled),
            state = self.state.lock() => state,
        };

        // The lock is held while sleeping so later callers keep their place
        // in the queue behind this one.
        loop {
            state.refill(self.rate, self.capacity);
            if state.take() {
                return Ok(());
            }

            let missing = 1.0 - state.tokens;
            let wait = Duration::try_from_secs_f64(missing / self.rate).unwrap_or(Duration::MAX);
            tracing::trace!(wait_ms = wait.as_millis(), "Waiting for rate limiter token");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Canceled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Takes a token if one is available right now.
    ///
    /// Returns `false` when the bucket is empty or another caller is queued.
    pub fn try_acquire(&self) -> bool {
        match self.state.try_lock() {
            Ok(mut state) => {
                state.refill(self.rate, self.capacity);
                state.take()
            }
            Err(_) => false,
        }
    }

    /// Current number of tokens in the bucket, after refilling.
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        state.refill(self.rate, self.capacity);
        state.tokens
    }
}

/// Information extracted from rate limit headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitInfo {
    /// When the rate limit resets (from X-RateLimit-Reset or RateLimit-Reset headers).
    pub reset_at: Option<SystemTime>,

    /// How long to wait before retrying (from Retry-After header).
    pub retry_after: Option<Duration>,

    /// Number of requests remaining in the current window.
    pub remaining: Option<u64>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from HTTP response headers.
    ///
    /// Parses:
    /// - `Retry-After` (seconds or HTTP date)
    /// - `X-RateLimit-Reset` / `RateLimit-Reset` (Unix timestamp)
    /// - `X-RateLimit-Remaining`
    ///
    /// # Examples
    ///
    /// ```
    /// use costops_client::rate_limit::RateLimitInfo;
    /// use http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("retry-after", "60".parse().unwrap());
    ///
    /// let info = RateLimitInfo::from_headers(&headers);
    /// assert_eq!(info.retry_after, Some(std::time::Duration::from_secs(60)));
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            reset_at: parse_rate_limit_reset(headers),
            retry_after: parse_retry_after(headers),
            remaining: parse_rate_limit_remaining(headers),
        }
    }

    /// Returns `true` if none of the headers were present.
    pub fn is_empty(&self) -> bool {
        self.reset_at.is_none() && self.retry_after.is_none() && self.remaining.is_none()
    }

    /// Returns the recommended delay before retrying, capped by `max_wait`.
    ///
    /// `retry_after` wins over `reset_at`. Returns `None` without either.
    pub fn delay(&self, max_wait: Duration) -> Option<Duration> {
        if let Some(retry_after) = self.retry_after {
            return Some(retry_after.min(max_wait));
        }

        if let Some(reset_at) = self.reset_at {
            if let Ok(until_reset) = reset_at.duration_since(SystemTime::now()) {
                return Some(until_reset.min(max_wait));
            }
        }

        None
    }
}

/// Parses the Retry-After header, as delay-seconds or HTTP date.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get("retry-after")?.to_str().ok()?.trim();

    if let Ok(seconds) = header.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date_time = httpdate::parse_http_date(header).ok()?;
    Some(
        date_time
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}

/// Parses X-RateLimit-Reset or RateLimit-Reset (Unix timestamp).
fn parse_rate_limit_reset(headers: &HeaderMap) -> Option<SystemTime> {
    ["x-ratelimit-reset", "ratelimit-reset"]
        .iter()
        .filter_map(|name| headers.get(*name)?.to_str().ok()?.trim().parse::<u64>().ok())
        .map(|timestamp| UNIX_EPOCH + Duration::from_secs(timestamp))
        .next()
}

fn parse_rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("x-ratelimit-remaining")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
