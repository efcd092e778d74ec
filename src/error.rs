//! Error types for Cost Ops API calls.
//!
//! Every public operation returns either its typed result or exactly one [`Error`].
//! Variants keep as much of the failed exchange as is useful for debugging: the
//! status code, the raw response body and, when the service sent one, the
//! structured [`ApiError`] payload. [`Error::kind`] collapses the variants into the
//! closed [`ErrorKind`] set so callers can branch on the category alone.

use crate::rate_limit::RateLimitInfo;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Boxed error used for transport failures that do not come from `reqwest`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Structured error body returned by the Cost Ops API.
///
/// ```json
/// {"code": "INVALID_PARAM", "message": "Invalid parameter", "details": "Field 'model' is required"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable error code.
    #[serde(default)]
    pub code: String,
    /// Human-readable message, surfaced verbatim.
    pub message: String,
    /// Optional free-form details (a string or any JSON value).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(serde_json::Value::String(details)) => {
                write!(f, "{} - {} (code: {})", self.message, details, self.code)
            }
            Some(details) => write!(f, "{} - {} (code: {})", self.message, details, self.code),
            None => write!(f, "{} (code: {})", self.message, self.code),
        }
    }
}

fn api_suffix(api: &Option<ApiError>) -> String {
    match api {
        Some(api) => format!(": {}", api),
        None => String::new(),
    }
}

fn body_or_api(raw_response: &str, api: &Option<ApiError>) -> String {
    match api {
        Some(api) => api.to_string(),
        None => raw_response.to_string(),
    }
}

/// The closed set of error categories a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The client configuration was rejected at construction time.
    InvalidConfig,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// HTTP 500, 502 or 503.
    ServerError,
    /// HTTP 400, or a request rejected locally before any I/O.
    BadRequest,
    /// The caller's cancellation token fired.
    Canceled,
    /// The client was closed.
    Closed,
    /// A 2xx body could not be decoded into the expected type.
    Decode,
    /// The retry budget was spent on retryable failures.
    RetriesExhausted,
    /// Connection, DNS or per-attempt timeout failure.
    Transport,
    /// Any other non-2xx status.
    UnexpectedStatus,
    /// Writing exported data to a caller-supplied sink failed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidConfig => "invalid configuration",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not found",
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::ServerError => "server error",
            ErrorKind::BadRequest => "bad request",
            ErrorKind::Canceled => "canceled",
            ErrorKind::Closed => "client closed",
            ErrorKind::Decode => "decode failure",
            ErrorKind::RetriesExhausted => "retries exhausted",
            ErrorKind::Transport => "transport failure",
            ErrorKind::UnexpectedStatus => "unexpected status",
            ErrorKind::Io => "i/o failure",
        };
        f.write_str(name)
    }
}

/// The main error type for Cost Ops API calls.
///
/// # Examples
///
/// ```no_run
/// use costops_client::{CancellationToken, Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().api_key("secret").build()?;
/// let cancel = CancellationToken::new();
///
/// match client.pricing().get(&cancel, "price_123").await {
///     Ok(table) => println!("{:?}", table.pricing_structure),
///     Err(Error::NotFound { .. }) => println!("no such pricing table"),
///     Err(Error::RetriesExhausted { attempts, last_error }) => {
///         eprintln!("gave up after {attempts} attempts: {last_error}");
///     }
///     Err(e) => eprintln!("{} ({})", e, e.kind()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid client configuration. Only produced by
    /// [`ClientBuilder::build`](crate::ClientBuilder::build).
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// The API key was rejected (HTTP 401).
    #[error("Unauthorized: invalid API key{}", api_suffix(.api))]
    Unauthorized {
        /// Structured error body, if the service sent one.
        api: Option<ApiError>,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Resource not found{}", api_suffix(.api))]
    NotFound {
        /// Structured error body, if the service sent one.
        api: Option<ApiError>,
    },

    /// The service is throttling this client (HTTP 429).
    #[error("Rate limit exceeded{}", api_suffix(.api))]
    RateLimited {
        /// Structured error body, if the service sent one.
        api: Option<ApiError>,
        /// Rate limit hints parsed from the response headers.
        rate_limit_info: Option<RateLimitInfo>,
    },

    /// The service failed (HTTP 500, 502 or 503).
    #[error("Server error {status}: {}", body_or_api(.raw_response, .api))]
    ServerError {
        /// The HTTP status code.
        status: StatusCode,
        /// The raw response body.
        raw_response: String,
        /// Structured error body, if the service sent one.
        api: Option<ApiError>,
    },

    /// The request was rejected, either by the service (HTTP 400) or locally
    /// before any network round-trip (`status` is `None`).
    #[error("Bad request: {message}")]
    BadRequest {
        /// The HTTP status code, `None` for local validation failures.
        status: Option<StatusCode>,
        /// What was wrong with the request.
        message: String,
        /// Structured error body, if the service sent one.
        api: Option<ApiError>,
    },

    /// Any other non-2xx status.
    #[error("Unexpected status code {status}: {raw_response}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: StatusCode,
        /// The raw response body.
        raw_response: String,
        /// Structured error body, if the service sent one.
        api: Option<ApiError>,
    },

    /// The caller's cancellation token fired before the operation completed.
    #[error("Operation canceled")]
    Canceled,

    /// The operation was attempted after [`Client::close`](crate::Client::close).
    #[error("Client is closed")]
    Closed,

    /// The service answered 2xx but the body did not match the expected type.
    #[error("Failed to decode response (status {status}): {serde_error}")]
    Decode {
        /// The raw response body that failed to decode.
        raw_response: String,
        /// The serde error message.
        serde_error: String,
        /// The HTTP status code.
        status: StatusCode,
    },

    /// Every permitted attempt failed with a retryable error.
    #[error("Request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of physical attempts made.
        attempts: usize,
        /// The failure observed on the final attempt.
        last_error: Box<Error>,
    },

    /// A network-level failure (connection refused, DNS, TLS, ...).
    #[error("Network error: {0}")]
    Network(#[source] BoxError),

    /// A single attempt exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The request body could not be serialized to JSON.
    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    /// Writing exported data failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(Box::new(err))
        }
    }
}

impl Error {
    /// Builds a locally detected bad-request error.
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest {
            status: None,
            message: message.into(),
            api: None,
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Error::Unauthorized { .. } => ErrorKind::Unauthorized,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::ServerError { .. } => ErrorKind::ServerError,
            Error::BadRequest { .. } | Error::Serialization(_) => ErrorKind::BadRequest,
            Error::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            Error::Canceled => ErrorKind::Canceled,
            Error::Closed => ErrorKind::Closed,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            Error::Network(_) | Error::Timeout => ErrorKind::Transport,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns `true` if another attempt could succeed.
    ///
    /// Transport failures, 429 and 500/502/503 are retryable. Everything else,
    /// including cancellation and decode failures, is terminal.
    ///
    /// # Examples
    ///
    /// ```
    /// use costops_client::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::ServerError {
    ///     status: StatusCode::BAD_GATEWAY,
    ///     raw_response: "upstream down".to_string(),
    ///     api: None,
    /// };
    /// assert!(err.is_retryable());
    /// assert!(!Error::Canceled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout => true,
            Error::RateLimited { .. } | Error::ServerError { .. } => true,
            _ => false,
        }
    }

    /// Returns the HTTP status code behind this error, if there was a response.
    ///
    /// For [`Error::RetriesExhausted`] this is the status of the last attempt.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Error::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Error::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Error::ServerError { status, .. } => Some(*status),
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::BadRequest { status, .. } => *status,
            Error::Decode { status, .. } => Some(*status),
            Error::RetriesExhausted { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Returns the structured error body sent by the service, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Unauthorized { api }
            | Error::NotFound { api }
            | Error::RateLimited { api, .. }
            | Error::ServerError { api, .. }
            | Error::BadRequest { api, .. }
            | Error::UnexpectedStatus { api, .. } => api.as_ref(),
            Error::RetriesExhausted { last_error, .. } => last_error.api_error(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error carries one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::ServerError { raw_response, .. }
            | Error::UnexpectedStatus { raw_response, .. }
            | Error::Decode { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the failure wrapped by [`Error::RetriesExhausted`].
    pub fn last_error(&self) -> Option<&Error> {
        match self {
            Error::RetriesExhausted { last_error, .. } => Some(last_error),
            _ => None,
        }
    }

    /// Returns rate limit information parsed from a 429 response.
    pub fn rate_limit_info(&self) -> Option<&RateLimitInfo> {
        match self {
            Error::RateLimited {
                rate_limit_info, ..
            } => rate_limit_info.as_ref(),
            _ => None,
        }
    }

    /// Returns the server-recommended delay before retrying, capped by `max_wait`.
    pub fn rate_limit_delay(&self, max_wait: Duration) -> Option<Duration> {
        self.rate_limit_info()?.delay(max_wait)
    }
}

/// A specialized `Result` type for Cost Ops API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(status: StatusCode) -> Error {
        Error::ServerError {
            status,
            raw_response: "boom".to_string(),
            api: None,
        }
    }

    #[test]
    fn test_retryable_categories() {
        assert!(server_error(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
        assert!(Error::RateLimited {
            api: None,
            rate_limit_info: None
        }
        .is_retryable());
        assert!(Error::Timeout.is_retryable());

        assert!(!Error::bad_request("id is required").is_retryable());
        assert!(!Error::NotFound { api: None }.is_retryable());
        assert!(!Error::Unauthorized { api: None }.is_retryable());
        assert!(!Error::Canceled.is_retryable());
        assert!(!Error::Closed.is_retryable());
        assert!(!Error::Decode {
            raw_response: "nope".to_string(),
            serde_error: "expected value".to_string(),
            status: StatusCode::OK,
        }
        .is_retryable());
    }

    #[test]
    fn test_retries_exhausted_exposes_last_error() {
        let err = Error::RetriesExhausted {
            attempts: 4,
            last_error: Box::new(server_error(StatusCode::SERVICE_UNAVAILABLE)),
        };

        assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(
            err.last_error().map(Error::kind),
            Some(ErrorKind::ServerError)
        );
        assert!(err.to_string().contains("after 4 attempts"));
    }

    #[test]
    fn test_api_error_is_surfaced_verbatim() {
        let api = ApiError {
            code: "INVALID_PARAM".to_string(),
            message: "Invalid parameter".to_string(),
            details: Some(serde_json::json!("Field 'model' is required")),
        };
        let err = Error::BadRequest {
            status: Some(StatusCode::BAD_REQUEST),
            message: api.message.clone(),
            api: Some(api),
        };

        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.api_error().map(|a| a.code.as_str()), Some("INVALID_PARAM"));
        assert_eq!(err.to_string(), "Bad request: Invalid parameter");

        let not_found = Error::NotFound {
            api: Some(ApiError {
                code: "NOT_FOUND".to_string(),
                message: "pricing table missing".to_string(),
                details: None,
            }),
        };
        assert_eq!(
            not_found.to_string(),
            "Resource not found: pricing table missing (code: NOT_FOUND)"
        );
    }

    #[test]
    fn test_local_bad_request_has_no_status() {
        let err = Error::bad_request("model is required");
        assert_eq!(err.status(), None);
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "Bad request: model is required");
    }
}
