//! Pluggable metrics reporting.
//!
//! The client reports every physical attempt and every failure to a
//! [`MetricsCollector`]. Without one configured it uses [`NoopMetrics`].

use crate::Error;
use http::{Method, StatusCode};
use std::time::Duration;

/// How a single physical attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A response arrived with this status.
    Status(StatusCode),
    /// The transport failed before a response arrived.
    Failed,
    /// The caller cancelled while the request was in flight.
    Canceled,
}

/// Receives per-attempt and per-failure measurements.
///
/// Both methods are called on the request path and should not block.
///
/// # Examples
///
/// ```
/// use costops_client::metrics::{AttemptOutcome, MetricsCollector};
/// use costops_client::Error;
/// use http::Method;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counter {
///     attempts: AtomicUsize,
///     errors: AtomicUsize,
/// }
///
/// impl MetricsCollector for Counter {
///     fn record_request(&self, _method: &Method, _outcome: AttemptOutcome, _duration: Duration) {
///         self.attempts.fetch_add(1, Ordering::Relaxed);
///     }
///
///     fn record_error(&self, _operation: &str, _error: &Error) {
///         self.errors.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait MetricsCollector: Send + Sync {
    /// Called once per physical HTTP attempt.
    fn record_request(&self, method: &Method, outcome: AttemptOutcome, duration: Duration);

    /// Called for every failed attempt and for failures before dispatch.
    ///
    /// `operation` is `"<METHOD> <path>"`.
    fn record_error(&self, operation: &str, error: &Error);
}

/// A collector that discards everything. The default for every client.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsCollector for NoopMetrics {
    fn record_request(&self, _method: &Method, _outcome: AttemptOutcome, _duration: Duration) {}

    fn record_error(&self, _operation: &str, _error: &Error) {}
}
