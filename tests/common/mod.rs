//! Shared test doubles.
#![allow(dead_code)]

use async_trait::async_trait;
use costops_client::metrics::{AttemptOutcome, MetricsCollector};
use costops_client::transport::{HttpRequest, Transport};
use costops_client::{Client, ClientBuilder, Error, ErrorKind, ResponseEnvelope, Result};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// What the scripted transport does for one request.
pub enum Step {
    Respond {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: String,
    },
    /// 200 with the request body as the response body.
    Echo,
    Timeout,
    Refused,
    /// Never answers.
    Hang,
}

impl Step {
    pub fn status(status: u16) -> Self {
        Step::Respond {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Step::Respond {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }
}

/// In-memory transport that plays a script of responses and records every
/// request it sees. Once the script runs out it answers `200 {}`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<(Instant, HttpRequest)>>,
    closes: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Gaps between consecutive attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        let requests = self.requests.lock().unwrap();
        requests
            .windows(2)
            .map(|pair| pair[1].0.duration_since(pair[0].0))
            .collect()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<ResponseEnvelope> {
        let body = request.body.clone().unwrap_or_default();
        self.requests
            .lock()
            .unwrap()
            .push((Instant::now(), request));

        let step = self.script.lock().unwrap().pop_front();
        match step {
            None => Ok(ResponseEnvelope::new(
                StatusCode::OK,
                HeaderMap::new(),
                b"{}".to_vec(),
            )),
            Some(Step::Respond {
                status,
                headers,
                body,
            }) => {
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    map.insert(name, HeaderValue::from_static(value));
                }
                Ok(ResponseEnvelope::new(
                    StatusCode::from_u16(status).unwrap(),
                    map,
                    body.into_bytes(),
                ))
            }
            Some(Step::Echo) => Ok(ResponseEnvelope::new(StatusCode::OK, HeaderMap::new(), body)),
            Some(Step::Timeout) => Err(Error::Timeout),
            Some(Step::Refused) => Err(Error::Network(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))),
            Some(Step::Hang) => std::future::pending().await,
        }
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Metrics collector that keeps everything it is given.
#[derive(Default)]
pub struct RecordingMetrics {
    pub requests: Mutex<Vec<(Method, AttemptOutcome)>>,
    pub errors: Mutex<Vec<(String, ErrorKind)>>,
}

impl RecordingMetrics {
    pub fn outcomes(&self) -> Vec<AttemptOutcome> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, outcome)| *outcome)
            .collect()
    }

    pub fn errors(&self) -> Vec<(String, ErrorKind)> {
        self.errors.lock().unwrap().clone()
    }
}

impl MetricsCollector for RecordingMetrics {
    fn record_request(&self, method: &Method, outcome: AttemptOutcome, _duration: Duration) {
        self.requests.lock().unwrap().push((method.clone(), outcome));
    }

    fn record_error(&self, operation: &str, error: &Error) {
        self.errors
            .lock()
            .unwrap()
            .push((operation.to_string(), error.kind()));
    }
}

/// Builder with fast, deterministic retries.
pub fn builder() -> ClientBuilder {
    Client::builder()
        .api_key("test-key")
        .retry_delay(Duration::from_millis(10))
        .jitter(false)
}

pub fn scripted_client(transport: Arc<ScriptedTransport>) -> Client {
    builder()
        .base_url("http://costops.test")
        .transport(transport)
        .build()
        .unwrap()
}

pub fn mock_client(uri: &str) -> Client {
    builder().base_url(uri).build().unwrap()
}
