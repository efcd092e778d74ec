//! Wire types for the Cost Ops API.
//!
//! Monetary amounts are decimal strings exactly as the service sends them; the
//! client never does arithmetic on them. Timestamps are RFC 3339 in UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An LLM provider.
///
/// Unknown provider names round-trip through [`Provider::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    Azure,
    Aws,
    Cohere,
    Mistral,
    Other(String),
}

impl Provider {
    pub fn as_str(&self) -> &str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::Azure => "azure",
            Provider::Aws => "aws",
            Provider::Cohere => "cohere",
            Provider::Mistral => "mistral",
            Provider::Other(name) => name,
        }
    }
}

impl From<String> for Provider {
    fn from(name: String) -> Self {
        match name.as_str() {
            "openai" => Provider::OpenAi,
            "anthropic" => Provider::Anthropic,
            "google" => Provider::Google,
            "azure" => Provider::Azure,
            "aws" => Provider::Aws,
            "cohere" => Provider::Cohere,
            "mistral" => Provider::Mistral,
            _ => Provider::Other(name),
        }
    }
}

impl From<&str> for Provider {
    fn from(name: &str) -> Self {
        Provider::from(name.to_string())
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ISO 4217 currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Other(String),
}

impl Currency {
    pub fn as_str(&self) -> &str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Other(code) => code,
        }
    }
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        match code.as_str() {
            "USD" => Currency::Usd,
            "EUR" => Currency::Eur,
            "GBP" => Currency::Gbp,
            _ => Currency::Other(code),
        }
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        match currency {
            Currency::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predefined reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "last-hour")]
    LastHour,
    #[serde(rename = "last-24-hours")]
    Last24Hours,
    #[serde(rename = "last-7-days")]
    Last7Days,
    #[serde(rename = "last-30-days")]
    Last30Days,
    #[serde(rename = "last-90-days")]
    Last90Days,
    /// Use explicit start and end times.
    #[serde(rename = "custom")]
    Custom,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::LastHour => "last-hour",
            TimeRange::Last24Hours => "last-24-hours",
            TimeRange::Last7Days => "last-7-days",
            TimeRange::Last30Days => "last-30-days",
            TimeRange::Last90Days => "last-90-days",
            TimeRange::Custom => "custom",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

/// Bucket size for cost analytics time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
    Jsonl,
}

impl ExportFormat {
    /// Conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Jsonl => "jsonl",
        }
    }
}

/// An LLM model as reported with a usage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u64>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            context_window: None,
        }
    }
}

/// Where a usage record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Token usage of one LLM request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Assigned by the service; empty when ingesting.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub provider: Provider,
    pub model: Model,
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Set by the service on ingestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl UsageRecord {
    /// A record timestamped now, with `total_tokens` derived from the parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use costops_client::models::{Model, Provider, UsageRecord};
    ///
    /// let record = UsageRecord::new(Provider::Anthropic, Model::new("claude-3-opus"), "org-1", 1200, 300);
    /// assert_eq!(record.total_tokens, 1500);
    /// ```
    pub fn new(
        provider: Provider,
        model: Model,
        organization_id: impl Into<String>,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Self {
        Self {
            id: String::new(),
            timestamp: Utc::now(),
            provider,
            model,
            organization_id: organization_id.into(),
            project_id: None,
            user_id: None,
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            cached_tokens: None,
            reasoning_tokens: None,
            latency_ms: None,
            tags: Vec::new(),
            metadata: HashMap::new(),
            ingested_at: None,
            source: None,
        }
    }
}

/// The computed cost of one usage record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub id: String,
    pub usage_id: String,
    pub provider: Provider,
    pub model: String,
    pub input_cost: String,
    pub output_cost: String,
    pub total_cost: String,
    pub currency: Currency,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    pub id: String,
    pub provider: Provider,
    pub model: String,
    pub pricing_structure: PricingStructure,
    #[serde(default)]
    pub currency: Currency,
    pub effective_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// How a model is billed. Prices are per million tokens unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PricingStructure {
    PerToken {
        input_price_per_million: f64,
        output_price_per_million: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cached_input_discount: Option<f64>,
    },
    PerRequest {
        price_per_request: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        included_tokens: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overage_price_per_million: Option<f64>,
    },
    Tiered {
        tiers: Vec<PricingTier>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    /// Token count at which this tier starts.
    pub threshold: u64,
    pub input_price_per_million: f64,
    pub output_price_per_million: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub period: Period,
    pub total_cost: String,
    pub total_requests: u64,
    pub avg_cost: String,
    #[serde(default)]
    pub by_provider: HashMap<Provider, String>,
    #[serde(default)]
    pub by_model: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub by_project: HashMap<String, String>,
}

/// Narrows an export or report to a subset of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
}

/// Result of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub checks: HashMap<String, Health>,
}

impl HealthStatus {
    /// `true` when the service reports itself as healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "healthy")
    }
}

/// One dependency check inside [`HealthStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Page selection for list operations. Unset fields use the service default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub period: Period,
    pub total_requests: u64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub by_provider: HashMap<Provider, UsageBreakdown>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub by_model: HashMap<String, UsageBreakdown>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub by_project: HashMap<String, UsageBreakdown>,
}

/// Usage totals for one provider, model or project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageBreakdown {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAnalytics {
    pub period: Period,
    pub granularity: Granularity,
    #[serde(default)]
    pub data_points: Vec<CostDataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostDataPoint {
    pub timestamp: DateTime<Utc>,
    pub cost: String,
    pub requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    /// `increasing`, `decreasing` or `stable`.
    pub direction: String,
    pub change_rate: f64,
    pub confidence: f64,
}

/// A recurring report delivered by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledReport {
    pub id: String,
    pub name: String,
    /// Cron expression.
    pub schedule: String,
    pub format: ExportFormat,
    /// `cost`, `usage`, `forecast` or `audit`.
    pub report_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// `email`, `storage` or `webhook`.
    pub delivery_method: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub delivery_config: HashMap<String, serde_json::Value>,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_passthrough() {
        let known: Provider = serde_json::from_value(json!("anthropic")).unwrap();
        assert_eq!(known, Provider::Anthropic);

        let unknown: Provider = serde_json::from_value(json!("groq")).unwrap();
        assert_eq!(unknown, Provider::Other("groq".to_string()));
        assert_eq!(serde_json::to_value(&unknown).unwrap(), json!("groq"));
        assert_eq!(Provider::OpenAi.to_string(), "openai");
    }

    #[test]
    fn test_provider_as_map_key() {
        let summary: CostSummary = serde_json::from_value(json!({
            "period": {"start": "2024-01-01T00:00:00Z", "end": "2024-02-01T00:00:00Z"},
            "total_cost": "12.50",
            "total_requests": 40,
            "avg_cost": "0.3125",
            "by_provider": {"openai": "10.00", "groq": "2.50"},
            "by_model": {"gpt-4": "10.00"}
        }))
        .unwrap();

        assert_eq!(summary.by_provider[&Provider::OpenAi], "10.00");
        assert_eq!(summary.by_provider[&Provider::from("groq")], "2.50");
        assert!(summary.by_project.is_empty());
    }

    #[test]
    fn test_time_range_wire_names() {
        assert_eq!(
            serde_json::to_value(TimeRange::Last24Hours).unwrap(),
            json!("last-24-hours")
        );
        for range in [
            TimeRange::LastHour,
            TimeRange::Last7Days,
            TimeRange::Last30Days,
            TimeRange::Last90Days,
            TimeRange::Custom,
        ] {
            assert_eq!(serde_json::to_value(range).unwrap(), json!(range.as_str()));
        }
    }

    #[test]
    fn test_pricing_structure_is_tagged() {
        let table: PricingTable = serde_json::from_value(json!({
            "id": "price_1",
            "provider": "openai",
            "model": "gpt-4",
            "pricing_structure": {
                "type": "per_token",
                "input_price_per_million": 30.0,
                "output_price_per_million": 60.0
            },
            "currency": "USD",
            "effective_date": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(
            table.pricing_structure,
            PricingStructure::PerToken {
                input_price_per_million: 30.0,
                output_price_per_million: 60.0,
                cached_input_discount: None,
            }
        );
        assert_eq!(table.currency, Currency::Usd);

        let tiered = serde_json::to_value(PricingStructure::Tiered {
            tiers: vec![PricingTier {
                threshold: 1_000_000,
                input_price_per_million: 2.5,
                output_price_per_million: 10.0,
            }],
        })
        .unwrap();
        assert_eq!(tiered["type"], "tiered");
        assert_eq!(tiered["tiers"][0]["threshold"], 1_000_000);
    }

    #[test]
    fn test_new_usage_record_omits_server_fields() {
        let record = UsageRecord::new(Provider::OpenAi, Model::new("gpt-4"), "org-1", 100, 50);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["total_tokens"], 150);
        assert_eq!(value["model"], json!({"name": "gpt-4"}));
        assert!(value.get("id").is_none());
        assert!(value.get("ingested_at").is_none());
        assert!(value.get("tags").is_none());
    }
}
