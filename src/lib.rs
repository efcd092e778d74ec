//! # costops-client - a resilient client for the LLM Cost Ops API
//!
//! `costops-client` turns method calls into reliable HTTP interactions with the
//! Cost Ops service. It handles authentication, client-side rate limiting,
//! retries with exponential backoff, cancellation, connection reuse and
//! classification of failures into a closed set of error categories.
//!
//! ## Quick Start
//!
//! ```no_run
//! use costops_client::models::{Model, Provider, TimeRange, UsageRecord};
//! use costops_client::resources::{CostSummaryParams, TimeWindow};
//! use costops_client::{CancellationToken, Client};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), costops_client::Error> {
//!     let client = Client::builder()
//!         .api_key(std::env::var("COSTOPS_API_KEY").unwrap_or_default())
//!         .timeout(Duration::from_secs(10))
//!         .max_retries(3)
//!         .build()?;
//!     let cancel = CancellationToken::new();
//!
//!     // Report usage
//!     let record = UsageRecord::new(Provider::OpenAi, Model::new("gpt-4"), "org-1", 1200, 350);
//!     client.usage().ingest(&cancel, &[record]).await?;
//!
//!     // Read it back as cost
//!     let params = CostSummaryParams {
//!         window: TimeWindow::range(TimeRange::Last7Days),
//!         group_by: vec!["provider".to_string()],
//!     };
//!     let summary = client.costs().summary(&cancel, &params).await?;
//!     println!("spent {} over {} requests", summary.total_cost, summary.total_requests);
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Typed resources** - pricing, usage, costs, export and health operations with serde models
//! - **Retries** - transport failures, 429 and 500/502/503 are retried with capped, jittered exponential backoff
//! - **Rate limiting** - a token bucket smooths bursts to the configured requests per second
//! - **Cancellation** - every wait (rate limiter, network, backoff) races a [`CancellationToken`]
//! - **Rich errors** - status, raw body and the service's structured error payload are kept
//! - **Logging** - structured `tracing` events for retries and failures
//! - **Pluggable** - custom [`transport::Transport`] and [`metrics::MetricsCollector`] implementations
//!
//! ## Error Handling
//!
//! ```no_run
//! use costops_client::{CancellationToken, Client, Error, ErrorKind};
//!
//! # async fn example(client: Client) {
//! let cancel = CancellationToken::new();
//! match client.usage().get(&cancel, "usage_42").await {
//!     Ok(record) => println!("{} tokens", record.total_tokens),
//!     Err(Error::NotFound { .. }) => println!("no such record"),
//!     Err(e) if e.kind() == ErrorKind::RetriesExhausted => {
//!         eprintln!("service unavailable: {}", e.last_error().map(|l| l.to_string()).unwrap_or_default());
//!     }
//!     Err(e) => eprintln!("request failed: {}", e),
//! }
//! # }
//! ```

mod classify;
mod client;
pub mod config;
mod error;
mod lifecycle;
pub mod metrics;
pub mod models;
pub mod rate_limit;
mod request;
pub mod resources;
mod response;
pub mod retry;
pub mod transport;

pub use classify::classify;
pub use client::Client;
pub use config::{ClientBuilder, ClientConfig};
pub use error::{ApiError, BoxError, Error, ErrorKind, Result};
pub use metrics::{AttemptOutcome, MetricsCollector, NoopMetrics};
pub use request::RequestDescriptor;
pub use response::ResponseEnvelope;
pub use retry::RetryPolicy;
pub use tokio_util::sync::CancellationToken;
