//! Maps HTTP responses onto the error taxonomy.

use crate::error::ApiError;
use crate::rate_limit::RateLimitInfo;
use crate::{Error, ResponseEnvelope};

/// Classifies a response. Returns `None` for 2xx.
///
/// The category depends only on the status code:
///
/// | Status | Error |
/// |---|---|
/// | 400 | [`Error::BadRequest`] |
/// | 401 | [`Error::Unauthorized`] |
/// | 404 | [`Error::NotFound`] |
/// | 429 | [`Error::RateLimited`] |
/// | 500, 502, 503 | [`Error::ServerError`] |
/// | other non-2xx | [`Error::UnexpectedStatus`] |
///
/// A JSON body of the form `{"code", "message", "details"}` with a non-empty
/// message is attached to the error as an [`ApiError`].
///
/// # Examples
///
/// ```
/// use costops_client::{classify, Error, ResponseEnvelope};
/// use http::{HeaderMap, StatusCode};
///
/// let response = ResponseEnvelope::new(
///     StatusCode::NOT_FOUND,
///     HeaderMap::new(),
///     br#"{"code":"NOT_FOUND","message":"no such usage record"}"#.to_vec(),
/// );
///
/// match classify(&response) {
///     Some(Error::NotFound { api: Some(api) }) => assert_eq!(api.message, "no such usage record"),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn classify(response: &ResponseEnvelope) -> Option<Error> {
    let status = response.status;
    if status.is_success() {
        return None;
    }

    let api = parse_api_error(&response.body);

    let error = match status.as_u16() {
        400 => Error::BadRequest {
            status: Some(status),
            message: match &api {
                Some(api) => api.message.clone(),
                None => response.text(),
            },
            api,
        },
        401 => Error::Unauthorized { api },
        404 => Error::NotFound { api },
        429 => {
            let info = RateLimitInfo::from_headers(&response.headers);
            Error::RateLimited {
                api,
                rate_limit_info: (!info.is_empty()).then_some(info),
            }
        }
        500 | 502 | 503 => Error::ServerError {
            status,
            raw_response: response.text(),
            api,
        },
        _ => Error::UnexpectedStatus {
            status,
            raw_response: response.text(),
            api,
        },
    };

    Some(error)
}

fn parse_api_error(body: &[u8]) -> Option<ApiError> {
    serde_json::from_slice::<ApiError>(body)
        .ok()
        .filter(|api| !api.message.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use http::{HeaderMap, HeaderValue, StatusCode};

    fn response(status: u16, body: &str) -> ResponseEnvelope {
        ResponseEnvelope::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_success_is_not_an_error() {
        assert!(classify(&response(200, "{}")).is_none());
        assert!(classify(&response(201, "")).is_none());
        assert!(classify(&response(204, "")).is_none());
    }

    #[test]
    fn test_status_mapping_is_exhaustive() {
        let cases = [
            (400, ErrorKind::BadRequest, false),
            (401, ErrorKind::Unauthorized, false),
            (403, ErrorKind::UnexpectedStatus, false),
            (404, ErrorKind::NotFound, false),
            (409, ErrorKind::UnexpectedStatus, false),
            (429, ErrorKind::RateLimited, true),
            (500, ErrorKind::ServerError, true),
            (502, ErrorKind::ServerError, true),
            (503, ErrorKind::ServerError, true),
            (504, ErrorKind::UnexpectedStatus, false),
            (302, ErrorKind::UnexpectedStatus, false),
        ];

        for (status, kind, retryable) in cases {
            let error = classify(&response(status, "plain text")).unwrap();
            assert_eq!(error.kind(), kind, "status {}", status);
            assert_eq!(error.is_retryable(), retryable, "status {}", status);
            assert_eq!(error.status().map(|s| s.as_u16()), Some(status));
        }
    }

    #[test]
    fn test_structured_body_keeps_status_category() {
        let body = r#"{"code":"UPSTREAM","message":"pricing store unavailable","details":{"retry":true}}"#;
        let error = classify(&response(503, body)).unwrap();

        assert_eq!(error.kind(), ErrorKind::ServerError);
        assert!(error.is_retryable());
        let api = error.api_error().unwrap();
        assert_eq!(api.code, "UPSTREAM");
        assert_eq!(api.message, "pricing store unavailable");
        assert_eq!(api.details, Some(serde_json::json!({"retry": true})));
    }

    #[test]
    fn test_bad_request_message() {
        let structured = classify(&response(
            400,
            r#"{"code":"INVALID_PARAM","message":"Invalid parameter","details":"Field 'model' is required"}"#,
        ))
        .unwrap();
        assert_eq!(structured.to_string(), "Bad request: Invalid parameter");

        let plain = classify(&response(400, "missing model")).unwrap();
        assert_eq!(plain.to_string(), "Bad request: missing model");
        assert!(plain.api_error().is_none());
    }

    #[test]
    fn test_empty_message_is_not_structured() {
        let error = classify(&response(500, r#"{"code":"X","message":""}"#)).unwrap();
        assert!(error.api_error().is_none());
        assert_eq!(error.raw_response(), Some(r#"{"code":"X","message":""}"#));
    }

    #[test]
    fn test_rate_limited_carries_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("2"));
        let limited = ResponseEnvelope::new(StatusCode::TOO_MANY_REQUESTS, headers, Vec::new());

        let error = classify(&limited).unwrap();
        assert_eq!(
            error.rate_limit_delay(std::time::Duration::from_secs(30)),
            Some(std::time::Duration::from_secs(2))
        );

        let bare = classify(&response(429, "")).unwrap();
        assert!(bare.rate_limit_info().is_none());
    }
}
