//! The raw result of one physical HTTP exchange.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

/// Status, headers and body bytes of a single HTTP response.
///
/// Produced by a [`Transport`](crate::transport::Transport) and consumed by
/// the classifier or the decoder within the same call.
///
/// # Examples
///
/// ```
/// use costops_client::ResponseEnvelope;
/// use http::{HeaderMap, StatusCode};
///
/// let response = ResponseEnvelope::new(StatusCode::OK, HeaderMap::new(), br#"{"status":"ok"}"#.to_vec());
/// let value: serde_json::Value = response.json().unwrap();
/// assert_eq!(value["status"], "ok");
/// ```
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The raw response body.
    pub body: Vec<u8>,
}

impl ResponseEnvelope {
    /// Creates a new envelope.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Decodes the body as JSON.
    ///
    /// An empty body decodes as JSON `null`, so `()` and `Option<T>` targets
    /// accept `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] with the raw body if decoding fails.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        };

        serde_json::from_slice(body).map_err(|e| Error::Decode {
            raw_response: self.text(),
            serde_error: e.to_string(),
            status: self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Health {
        status: String,
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let response = ResponseEnvelope::new(StatusCode::NO_CONTENT, HeaderMap::new(), Vec::new());

        response.json::<()>().unwrap();
        assert_eq!(response.json::<Option<Health>>().unwrap(), None);
        assert!(matches!(
            response.json::<Health>(),
            Err(Error::Decode { status, .. }) if status == StatusCode::NO_CONTENT
        ));
    }

    #[test]
    fn test_decode_failure_keeps_raw_body() {
        let response =
            ResponseEnvelope::new(StatusCode::OK, HeaderMap::new(), b"<html>oops</html>".to_vec());

        match response.json::<Health>() {
            Err(Error::Decode {
                raw_response,
                serde_error,
                status,
            }) => {
                assert_eq!(raw_response, "<html>oops</html>");
                assert!(serde_error.contains("expected"));
                assert_eq!(status, StatusCode::OK);
            }
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_header_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/csv"));
        let response = ResponseEnvelope::new(StatusCode::OK, headers, b"a,b\n".to_vec());

        assert!(response.is_success());
        assert_eq!(response.header("content-type"), Some("text/csv"));
        assert_eq!(response.header("x-missing"), None);
        assert_eq!(response.text(), "a,b\n");
    }
}
