//! Example demonstrating error handling, retries and cancellation.
//!
//! This example runs offline against an in-memory transport that plays back
//! canned responses, and shows how to:
//! - Branch on error categories with `Error::kind`
//! - Read the service's structured error payload
//! - Inspect the last failure behind `RetriesExhausted`
//! - Cancel a call that is waiting to retry
//!
//! Run with: `cargo run --example error_handling`

use async_trait::async_trait;
use costops_client::transport::{HttpRequest, Transport};
use costops_client::{CancellationToken, Client, Error, ErrorKind, ResponseEnvelope};
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Answers by path, so each section below sees a different failure.
struct CannedTransport;

#[async_trait]
impl Transport for CannedTransport {
    async fn send(&self, request: HttpRequest) -> costops_client::Result<ResponseEnvelope> {
        let (status, body) = match request.url.path() {
            "/api/v1/pricing/missing" => (
                StatusCode::NOT_FOUND,
                r#"{"code":"NOT_FOUND","message":"pricing table not found"}"#,
            ),
            "/api/v1/pricing" => (
                StatusCode::BAD_REQUEST,
                r#"{"code":"INVALID_PARAM","message":"Invalid parameter","details":"Field 'model' is required"}"#,
            ),
            _ => (StatusCode::SERVICE_UNAVAILABLE, "maintenance window"),
        };
        Ok(ResponseEnvelope::new(status, HeaderMap::new(), body.as_bytes().to_vec()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("costops_client=warn")
        .init();

    let client = Client::builder()
        .api_key("demo-key")
        .max_retries(2)
        .retry_delay(Duration::from_millis(200))
        .transport(Arc::new(CannedTransport))
        .build()?;
    let cancel = CancellationToken::new();

    println!("=== Example 1: Not Found ===");
    match client.pricing().get(&cancel, "missing").await {
        Ok(table) => println!("Found: {:?}", table),
        Err(Error::NotFound { api }) => {
            println!("Not found: {}", api.map(|a| a.message).unwrap_or_default());
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 2: Structured Bad Request ===");
    let params = costops_client::resources::PricingListParams::default();
    if let Err(e) = client.pricing().list(&cancel, &params).await {
        println!("Kind: {}", e.kind());
        println!("Status: {:?}", e.status());
        if let Some(api) = e.api_error() {
            println!("Code: {}", api.code);
            println!("Message: {}", api.message);
            println!("Details: {:?}", api.details);
        }
        println!("Retryable: {}", e.is_retryable());
    }
    println!();

    println!("=== Example 3: Retries Exhausted ===");
    match client.health().check(&cancel).await {
        Err(Error::RetriesExhausted { attempts, last_error }) => {
            println!("Gave up after {} attempts", attempts);
            println!("Last error: {}", last_error);
            println!("Raw response: {:?}", last_error.raw_response());
        }
        other => println!("Unexpected: {:?}", other.map(|h| h.status)),
    }
    println!();

    println!("=== Example 4: Local Validation ===");
    let err = client.usage().ingest(&cancel, &[]).await.unwrap_err();
    println!("{} (status: {:?})", err, err.status());
    println!();

    println!("=== Example 5: Cancellation ===");
    let slow = CancellationToken::new();
    let trigger = slow.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let err = client.health().live(&slow).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Canceled);
    println!("Canceled while waiting to retry: {}", err);

    client.close();
    let err = client.health().live(&cancel).await.unwrap_err();
    println!("After close: {}", err);

    Ok(())
}
