//! Typed operations grouped by API resource.
//!
//! Each façade borrows the [`Client`](crate::Client), checks its required
//! parameters locally (failing with [`Error::BadRequest`] and no network
//! traffic), builds a [`RequestDescriptor`] and runs it through the executor.

mod costs;
mod export;
mod health;
mod pricing;
mod usage;

pub use costs::{CostAnalyticsParams, CostListParams, CostSummaryParams, Costs};
pub use export::{Export, ExportParams, ReportScheduleParams};
pub use health::Health;
pub use pricing::{Pricing, PricingAddParams, PricingListParams};
pub use usage::{Usage, UsageListParams, UsageStatsParams};

use crate::models::{Pagination, TimeRange};
use crate::{Error, RequestDescriptor, Result};
use chrono::{DateTime, SecondsFormat, Utc};

/// Reporting window and scope shared by list, stats and summary queries.
///
/// # Examples
///
/// ```
/// use costops_client::models::TimeRange;
/// use costops_client::resources::TimeWindow;
///
/// let window = TimeWindow {
///     organization_id: Some("org-1".to_string()),
///     ..TimeWindow::range(TimeRange::Last7Days)
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeWindow {
    /// A predefined range such as `last-7-days`.
    pub range: Option<TimeRange>,
    /// Inclusive start, sent as RFC 3339.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive end; must not be before `start_time`.
    pub end_time: Option<DateTime<Utc>>,
    pub organization_id: Option<String>,
    pub project_id: Option<String>,
}

impl TimeWindow {
    /// A predefined window.
    pub fn range(range: TimeRange) -> Self {
        Self {
            range: Some(range),
            ..Self::default()
        }
    }

    /// An explicit `[start, end]` window.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            range: Some(TimeRange::Custom),
            start_time: Some(start),
            end_time: Some(end),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(Error::bad_request("start_time must not be after end_time"));
            }
        }
        Ok(())
    }

    /// Validates the window and appends it as query parameters.
    pub(crate) fn apply(&self, request: RequestDescriptor) -> Result<RequestDescriptor> {
        self.validate()?;
        Ok(request
            .with_optional_query_param("range", self.range)
            .with_optional_query_param("start_time", self.start_time.map(rfc3339))
            .with_optional_query_param("end_time", self.end_time.map(rfc3339))
            .with_optional_query_param("organization_id", non_empty(&self.organization_id))
            .with_optional_query_param("project_id", non_empty(&self.project_id)))
    }
}

/// Fails with a local bad request when `value` is blank.
pub(crate) fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::bad_request(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

pub(crate) fn paginate(request: RequestDescriptor, pagination: &Pagination) -> RequestDescriptor {
    request
        .with_optional_query_param("page", pagination.page.filter(|page| *page > 0))
        .with_optional_query_param(
            "page_size",
            pagination.page_size.filter(|size| *size > 0),
        )
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
