//! Cost records, summaries and analytics.

use super::{non_empty, paginate, require, TimeWindow};
use crate::models::{
    CostAnalytics, CostRecord, CostSummary, Granularity, Pagination, Provider, SortOrder,
};
use crate::{Client, Error, RequestDescriptor, Result};
use http::Method;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

const COSTS_PATH: &str = "/api/v1/costs";

/// Filters for [`Costs::list`]. Unset fields are omitted from the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostListParams {
    /// Time range, explicit bounds and organization/project scope.
    pub window: TimeWindow,
    /// Only records for this provider.
    pub provider: Option<Provider>,
    /// Only records for this model.
    pub model: Option<String>,
    /// Only records attributed to this user.
    pub user_id: Option<String>,
    /// Inclusive lower bound on a record's total cost. Must be finite and
    /// non-negative.
    pub min_cost: Option<f64>,
    /// Inclusive upper bound; not below `min_cost`.
    pub max_cost: Option<f64>,
    /// Field to sort on, e.g. `total_cost`.
    pub sort_by: Option<String>,
    /// Sort direction; server default when unset.
    pub sort_order: Option<SortOrder>,
    /// Page and page size; zero values are omitted.
    pub pagination: Pagination,
}

impl CostListParams {
    fn validate(&self) -> Result<()> {
        for (name, bound) in [("min_cost", self.min_cost), ("max_cost", self.max_cost)] {
            if bound.is_some_and(|cost| !cost.is_finite() || cost < 0.0) {
                return Err(Error::bad_request(format!(
                    "{} must be a non-negative number",
                    name
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_cost, self.max_cost) {
            if min > max {
                return Err(Error::bad_request("min_cost must not exceed max_cost"));
            }
        }
        Ok(())
    }
}

/// Parameters for [`Costs::summary`] and the breakdowns derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostSummaryParams {
    /// Time range, explicit bounds and organization/project scope.
    pub window: TimeWindow,
    /// Dimensions such as `provider`, `model` or `project`.
    pub group_by: Vec<String>,
}

/// Parameters for [`Costs::analytics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostAnalyticsParams {
    pub window: TimeWindow,
    /// Bucket size of the time series.
    pub granularity: Option<Granularity>,
}

/// Cost operations, from [`Client::costs`].
#[derive(Debug, Clone, Copy)]
pub struct Costs<'a> {
    client: &'a Client,
}

impl<'a> Costs<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetches one cost record by id.
    pub async fn get(&self, cancel: &CancellationToken, id: &str) -> Result<CostRecord> {
        require(id, "id")?;

        let request = RequestDescriptor::new(Method::GET, COSTS_PATH).segment(id);
        self.client.execute(cancel, request).await
    }

    /// Lists cost records matching `params`.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] without sending anything if the cost bounds or the
    /// window are invalid.
    pub async fn list(
        &self,
        cancel: &CancellationToken,
        params: &CostListParams,
    ) -> Result<Vec<CostRecord>> {
        params.validate()?;

        let request = params
            .window
            .apply(RequestDescriptor::new(Method::GET, COSTS_PATH))?
            .with_optional_query_param("provider", params.provider.as_ref())
            .with_optional_query_param("model", non_empty(&params.model))
            .with_optional_query_param("user_id", non_empty(&params.user_id))
            .with_optional_query_param("min_cost", params.min_cost.map(|cost| format!("{:.10}", cost)))
            .with_optional_query_param("max_cost", params.max_cost.map(|cost| format!("{:.10}", cost)))
            .with_optional_query_param("sort_by", non_empty(&params.sort_by))
            .with_optional_query_param("sort_order", params.sort_order);
        let request = paginate(request, &params.pagination);

        self.client.execute(cancel, request).await
    }

    /// Totals for the window, broken down by provider, model and project.
    pub async fn summary(
        &self,
        cancel: &CancellationToken,
        params: &CostSummaryParams,
    ) -> Result<CostSummary> {
        let request = params
            .window
            .apply(RequestDescriptor::new(Method::GET, "/api/v1/costs/summary"))?
            .with_repeated_query_param("group_by", params.group_by.iter().map(String::as_str));

        self.client.execute(cancel, request).await
    }

    /// Cost time series with an optional trend estimate.
    pub async fn analytics(
        &self,
        cancel: &CancellationToken,
        params: &CostAnalyticsParams,
    ) -> Result<CostAnalytics> {
        let request = params
            .window
            .apply(RequestDescriptor::new(Method::GET, "/api/v1/costs/analytics"))?
            .with_optional_query_param("granularity", params.granularity);

        self.client.execute(cancel, request).await
    }

    /// Total cost per provider, taken from [`summary`](Self::summary).
    pub async fn by_provider(
        &self,
        cancel: &CancellationToken,
        params: &CostSummaryParams,
    ) -> Result<HashMap<Provider, String>> {
        Ok(self.summary(cancel, params).await?.by_provider)
    }

    /// Total cost per model, taken from [`summary`](Self::summary).
    pub async fn by_model(
        &self,
        cancel: &CancellationToken,
        params: &CostSummaryParams,
    ) -> Result<HashMap<String, String>> {
        Ok(self.summary(cancel, params).await?.by_model)
    }
}
