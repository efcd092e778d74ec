//! Basic example: report usage, then read back pricing and costs.
//!
//! This example shows how to:
//! - Configure a client from `COSTOPS_*` environment variables
//! - Check service health
//! - Ingest usage records
//! - Query cost summaries and usage statistics
//!
//! Run with: `COSTOPS_API_KEY=... cargo run --example basic_usage`

use costops_client::models::{Model, Provider, TimeRange, UsageRecord};
use costops_client::resources::{CostSummaryParams, TimeWindow, UsageStatsParams};
use costops_client::{CancellationToken, ClientBuilder};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("costops_client=debug,basic_usage=info")
        .init();

    let client = ClientBuilder::from_env()
        .timeout(Duration::from_secs(10))
        .build()?;

    // Cancel everything still running after a minute
    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        deadline.cancel();
    });

    println!("=== Health ===");
    let health = client.health().check(&cancel).await?;
    println!("Status: {} (version {})", health.status, health.version);
    for (name, check) in &health.checks {
        println!("  {}: {}", name, check.status);
    }
    println!();

    println!("=== Ingest Usage ===");
    let mut record = UsageRecord::new(
        Provider::OpenAi,
        Model::new("gpt-4"),
        "org-demo",
        1_250,
        310,
    );
    record.project_id = Some("chatbot".to_string());
    record.tags = vec!["demo".to_string()];
    client.usage().ingest(&cancel, &[record]).await?;
    println!("Ingested 1 record");
    println!();

    println!("=== Active Pricing ===");
    let pricing = client
        .pricing()
        .get_active(&cancel, &Provider::OpenAi, "gpt-4")
        .await?;
    println!("{} {}: {:?}", pricing.provider, pricing.model, pricing.pricing_structure);
    println!();

    println!("=== Cost Summary (last 7 days) ===");
    let summary = client
        .costs()
        .summary(
            &cancel,
            &CostSummaryParams {
                window: TimeWindow::range(TimeRange::Last7Days),
                group_by: vec!["provider".to_string(), "model".to_string()],
            },
        )
        .await?;
    println!("Total: {} over {} requests", summary.total_cost, summary.total_requests);
    for (provider, cost) in &summary.by_provider {
        println!("  {}: {}", provider, cost);
    }
    println!();

    println!("=== Usage Stats (last 24 hours) ===");
    let stats = client
        .usage()
        .stats(
            &cancel,
            &UsageStatsParams {
                window: TimeWindow::range(TimeRange::Last24Hours),
                group_by: vec!["model".to_string()],
            },
        )
        .await?;
    println!("Tokens: {} in {} requests", stats.total_tokens, stats.total_requests);

    client.close();
    Ok(())
}
