//! Per-call request descriptors.

use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::fmt::Display;
use url::Url;

/// Everything needed to issue one logical API operation.
///
/// Path segments are stored unencoded and percent-encoded when the URL is
/// built, so identifiers containing `/`, `?` or spaces stay inside their
/// segment. Dot segments (`.` and `..`) are rejected. The JSON body is serialized once, up front, and copied into every
/// physical attempt.
///
/// # Examples
///
/// ```
/// use costops_client::RequestDescriptor;
/// use http::Method;
///
/// let request = RequestDescriptor::new(Method::GET, "/api/v1/pricing")
///     .segment("gpt-4/turbo")
///     .with_query_param("page", "2");
///
/// assert_eq!(request.path(), "/api/v1/pricing/gpt-4/turbo");
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// The HTTP method.
    pub method: Method,

    segments: Vec<String>,

    /// Extra headers for this request. An `Accept` header here replaces the
    /// default `application/json`.
    pub headers: HeaderMap,

    /// Query parameters in insertion order. Keys may repeat.
    pub query_params: Vec<(String, String)>,

    body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    /// Creates a descriptor for a static path such as `/api/v1/usage/stats`.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Appends one path segment, encoded as a single segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// The unencoded path, for logs and metrics.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::bad_request(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::bad_request(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter. Repeated keys are kept.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Adds a query parameter only when `value` is present.
    pub fn with_optional_query_param<V: Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query_param(key, value.to_string()),
            None => self,
        }
    }

    /// Adds the same key once per value.
    pub fn with_repeated_query_param<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self.query_params.push((key.to_string(), value.into()));
        }
        self
    }

    /// Sets the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if `body` cannot be encoded.
    pub fn with_json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| Error::Serialization(e.to_string()))?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// The encoded JSON body, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Resolves this descriptor against the client's base URL.
    ///
    /// Any path on the base URL is kept as a prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] for a `.` or `..` segment, which URL
    /// normalization would otherwise resolve into a different resource.
    pub(crate) fn url(&self, base_url: &Url) -> Result<Url> {
        if let Some(segment) = self
            .segments
            .iter()
            .find(|segment| matches!(segment.as_str(), "." | ".."))
        {
            return Err(Error::bad_request(format!(
                "Invalid path segment {:?} in {}",
                segment,
                self.path()
            )));
        }

        let mut url = base_url.clone();
        url.set_query(None);
        url.set_fragment(None);

        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfig(format!("{} cannot be a base URL", base_url)))?
            .pop_if_empty()
            .extend(&self.segments);

        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_url_joins_base_path_and_segments() {
        let request = RequestDescriptor::new(Method::GET, "/api/v1/pricing").segment("abc");

        assert_eq!(
            request.url(&base("https://api.example.com")).unwrap().as_str(),
            "https://api.example.com/api/v1/pricing/abc"
        );
        assert_eq!(
            request.url(&base("https://api.example.com/costops/")).unwrap().as_str(),
            "https://api.example.com/costops/api/v1/pricing/abc"
        );
    }

    #[test]
    fn test_dynamic_segments_are_escaped() {
        let request = RequestDescriptor::new(Method::GET, "/api/v1/pricing/active")
            .segment("azure")
            .segment("gpt-4o/mini 2024?");

        let url = request.url(&base("http://localhost:8080")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v1/pricing/active/azure/gpt-4o%2Fmini%202024%3F"
        );
    }

    #[test]
    fn test_query_params_keep_order_and_repeats() {
        let request = RequestDescriptor::new(Method::GET, "/api/v1/usage/stats")
            .with_query_param("range", "last-7-days")
            .with_repeated_query_param("group_by", ["provider", "model"])
            .with_optional_query_param::<u32>("page", None)
            .with_optional_query_param("page_size", Some(50));

        let url = request.url(&base("http://localhost")).unwrap();
        assert_eq!(
            url.query(),
            Some("range=last-7-days&group_by=provider&group_by=model&page_size=50")
        );
    }

    #[test]
    fn test_base_query_is_dropped() {
        let request = RequestDescriptor::new(Method::GET, "/health");
        let url = request.url(&base("http://localhost/?debug=1#frag")).unwrap();
        assert_eq!(url.as_str(), "http://localhost/health");
    }

    #[test]
    fn test_json_body_is_encoded_once() {
        let request = RequestDescriptor::new(Method::POST, "/api/v1/usage/ingest")
            .with_json_body(&serde_json::json!({"records": []}))
            .unwrap();

        assert_eq!(request.body(), Some(br#"{"records":[]}"#.as_slice()));
        assert!(RequestDescriptor::new(Method::GET, "/health").body().is_none());
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        for id in [".", ".."] {
            let request = RequestDescriptor::new(Method::DELETE, "/api/v1/pricing").segment(id);
            assert!(matches!(
                request.url(&base("http://localhost")),
                Err(Error::BadRequest { status: None, .. })
            ));
        }

        let request = RequestDescriptor::new(Method::GET, "/api/v1/pricing").segment("...");
        assert_eq!(
            request.url(&base("http://localhost")).unwrap().as_str(),
            "http://localhost/api/v1/pricing/..."
        );
    }

    #[test]
    fn test_invalid_header_is_bad_request() {
        let result = RequestDescriptor::new(Method::GET, "/health").with_header("bad header", "x");
        assert!(matches!(result, Err(Error::BadRequest { status: None, .. })));
    }
}
