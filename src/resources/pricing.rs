//! Pricing tables.

use super::{non_empty, paginate, require};
use crate::models::{Currency, Pagination, PricingTable, Provider};
use crate::{Client, RequestDescriptor, Result};
use chrono::{DateTime, Utc};
use http::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

const PRICING_PATH: &str = "/api/v1/pricing";

/// A new per-token pricing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingAddParams {
    /// The provider the price applies to.
    pub provider: Provider,
    /// The model name, as reported in usage records.
    pub model: String,
    /// Price per million input tokens.
    pub input_price_per_million: f64,
    /// Price per million output tokens.
    pub output_price_per_million: f64,
    /// Fractional discount for cached input tokens, e.g. `0.5`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_input_discount: Option<f64>,
    /// Defaults to USD on the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    /// When the price takes effect. Defaults to now on the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<DateTime<Utc>>,
}

impl PricingAddParams {
    /// Creates parameters with the required fields; the rest are left to
    /// server defaults.
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        input_price_per_million: f64,
        output_price_per_million: f64,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            input_price_per_million,
            output_price_per_million,
            cached_input_discount: None,
            currency: None,
            effective_date: None,
        }
    }
}

/// Filters for [`Pricing::list`]. Unset fields are omitted from the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingListParams {
    /// Only tables for this provider.
    pub provider: Option<Provider>,
    /// Only tables for this model.
    pub model: Option<String>,
    /// Only tables in effect now (`true`) or only expired ones (`false`).
    pub active: Option<bool>,
    /// Page and page size; zero values are omitted.
    pub pagination: Pagination,
}

/// Pricing operations, from [`Client::pricing`].
#[derive(Debug, Clone, Copy)]
pub struct Pricing<'a> {
    client: &'a Client,
}

impl<'a> Pricing<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Adds a pricing table. `provider` and `model` are required.
    pub async fn add(
        &self,
        cancel: &CancellationToken,
        params: &PricingAddParams,
    ) -> Result<PricingTable> {
        require(params.provider.as_str(), "provider")?;
        require(&params.model, "model")?;

        let request = RequestDescriptor::new(Method::POST, PRICING_PATH).with_json_body(params)?;
        self.client.execute(cancel, request).await
    }

    /// Fetches one pricing table by id.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) if no table has this id.
    pub async fn get(&self, cancel: &CancellationToken, id: &str) -> Result<PricingTable> {
        require(id, "id")?;

        let request = RequestDescriptor::new(Method::GET, PRICING_PATH).segment(id);
        self.client.execute(cancel, request).await
    }

    /// Lists pricing tables matching `params`.
    pub async fn list(
        &self,
        cancel: &CancellationToken,
        params: &PricingListParams,
    ) -> Result<Vec<PricingTable>> {
        let request = RequestDescriptor::new(Method::GET, PRICING_PATH)
            .with_optional_query_param("provider", params.provider.as_ref())
            .with_optional_query_param("model", non_empty(&params.model))
            .with_optional_query_param("active", params.active);
        let request = paginate(request, &params.pagination);

        self.client.execute(cancel, request).await
    }

    /// Deletes a pricing table.
    pub async fn delete(&self, cancel: &CancellationToken, id: &str) -> Result<()> {
        require(id, "id")?;

        let request = RequestDescriptor::new(Method::DELETE, PRICING_PATH).segment(id);
        self.client.execute_empty(cancel, request).await
    }

    /// The pricing table currently in effect for `provider` and `model`.
    pub async fn get_active(
        &self,
        cancel: &CancellationToken,
        provider: &Provider,
        model: &str,
    ) -> Result<PricingTable> {
        require(provider.as_str(), "provider")?;
        require(model, "model")?;

        let request = RequestDescriptor::new(Method::GET, "/api/v1/pricing/active")
            .segment(provider.as_str())
            .segment(model);
        self.client.execute(cancel, request).await
    }
}
