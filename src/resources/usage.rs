//! Usage records and statistics.

use super::{non_empty, paginate, require, TimeWindow};
use crate::models::{Pagination, Provider, SortOrder, UsageRecord, UsageStats};
use crate::{Client, RequestDescriptor, Result};
use http::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

const USAGE_PATH: &str = "/api/v1/usage";

/// Filters for [`Usage::list`]. Unset fields are omitted from the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageListParams {
    /// Time range, explicit bounds and organization/project scope.
    pub window: TimeWindow,
    /// Only records for this provider.
    pub provider: Option<Provider>,
    /// Only records for this model.
    pub model: Option<String>,
    /// Only records attributed to this user.
    pub user_id: Option<String>,
    /// Each tag is sent as its own `tags` parameter.
    pub tags: Vec<String>,
    /// Field to sort on, e.g. `timestamp`.
    pub sort_by: Option<String>,
    /// Sort direction; server default when unset.
    pub sort_order: Option<SortOrder>,
    /// Page and page size; zero values are omitted.
    pub pagination: Pagination,
}

/// Parameters for [`Usage::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStatsParams {
    /// Time range, explicit bounds and organization/project scope.
    pub window: TimeWindow,
    /// Dimensions such as `provider`, `model` or `project`.
    pub group_by: Vec<String>,
}

#[derive(Serialize)]
struct IngestBody<'a> {
    records: &'a [UsageRecord],
}

/// Usage operations, from [`Client::usage`].
#[derive(Debug, Clone, Copy)]
pub struct Usage<'a> {
    client: &'a Client,
}

impl<'a> Usage<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Submits usage records in one batch. At least one record is required.
    pub async fn ingest(&self, cancel: &CancellationToken, records: &[UsageRecord]) -> Result<()> {
        if records.is_empty() {
            return Err(crate::Error::bad_request("at least one record is required"));
        }

        let request = RequestDescriptor::new(Method::POST, "/api/v1/usage/ingest")
            .with_json_body(&IngestBody { records })?;
        self.client.execute_empty(cancel, request).await
    }

    /// Fetches one usage record by id.
    pub async fn get(&self, cancel: &CancellationToken, id: &str) -> Result<UsageRecord> {
        require(id, "id")?;

        let request = RequestDescriptor::new(Method::GET, USAGE_PATH).segment(id);
        self.client.execute(cancel, request).await
    }

    /// Lists usage records matching `params`.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`](crate::Error::BadRequest) without sending anything
    /// if the window's start is after its end.
    pub async fn list(
        &self,
        cancel: &CancellationToken,
        params: &UsageListParams,
    ) -> Result<Vec<UsageRecord>> {
        let request = params
            .window
            .apply(RequestDescriptor::new(Method::GET, USAGE_PATH))?
            .with_optional_query_param("provider", params.provider.as_ref())
            .with_optional_query_param("model", non_empty(&params.model))
            .with_optional_query_param("user_id", non_empty(&params.user_id))
            .with_repeated_query_param("tags", params.tags.iter().map(String::as_str))
            .with_optional_query_param("sort_by", non_empty(&params.sort_by))
            .with_optional_query_param("sort_order", params.sort_order);
        let request = paginate(request, &params.pagination);

        self.client.execute(cancel, request).await
    }

    /// Aggregated token and request counts.
    pub async fn stats(
        &self,
        cancel: &CancellationToken,
        params: &UsageStatsParams,
    ) -> Result<UsageStats> {
        let request = params
            .window
            .apply(RequestDescriptor::new(Method::GET, "/api/v1/usage/stats"))?
            .with_repeated_query_param("group_by", params.group_by.iter().map(String::as_str));

        self.client.execute(cancel, request).await
    }

    /// Deletes a usage record.
    pub async fn delete(&self, cancel: &CancellationToken, id: &str) -> Result<()> {
        require(id, "id")?;

        let request = RequestDescriptor::new(Method::DELETE, USAGE_PATH).segment(id);
        self.client.execute_empty(cancel, request).await
    }
}
