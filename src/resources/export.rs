//! Data exports and scheduled reports.

use super::require;
use crate::models::{ExportFormat, Filters, Period, Provider, ScheduledReport, TimeRange};
use crate::{Client, Error, RequestDescriptor, Result};
use http::Method;
use serde::Serialize;
use std::collections::HashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

const SCHEDULE_PATH: &str = "/api/v1/export/schedule";

/// What to export. The response body is returned as-is in `format`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportParams {
    /// Output format of the returned bytes.
    pub format: ExportFormat,
    /// A predefined range such as `last-30-days`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TimeRange>,
    /// Explicit window; takes the place of `range`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Only data for this provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Only data for this model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Additional provider, model, user and tag filters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
    /// Emit a header row for tabular formats.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_headers: bool,
}

impl ExportParams {
    /// An unfiltered export in `format`.
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            range: None,
            period: None,
            organization_id: None,
            project_id: None,
            provider: None,
            model: None,
            filters: None,
            include_headers: false,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(period) = &self.period {
            if period.start > period.end {
                return Err(Error::bad_request("period start must not be after its end"));
            }
        }
        Ok(())
    }
}

/// Definition of a scheduled report, for creation and full updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportScheduleParams {
    /// Display name; must not be blank.
    pub name: String,
    /// Cron expression; must not be blank.
    pub schedule: String,
    pub format: ExportFormat,
    /// `cost`, `usage`, `forecast` or `audit`.
    pub report_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// `email`, `storage` or `webhook`.
    pub delivery_method: String,
    /// Method-specific settings such as recipients or a webhook URL.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub delivery_config: HashMap<String, serde_json::Value>,
    /// Disabled reports keep their definition but do not run.
    pub enabled: bool,
}

impl ReportScheduleParams {
    fn validate(&self) -> Result<()> {
        require(&self.name, "name")?;
        require(&self.schedule, "schedule")
    }
}

/// Export operations, from [`Client::export`].
#[derive(Debug, Clone, Copy)]
pub struct Export<'a> {
    client: &'a Client,
}

impl<'a> Export<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Exports data and returns the raw bytes.
    ///
    /// Runs through the same rate limiting, retry and error classification as
    /// every other call.
    pub async fn export(&self, cancel: &CancellationToken, params: &ExportParams) -> Result<Vec<u8>> {
        params.validate()?;

        let request = RequestDescriptor::new(Method::POST, "/api/v1/export")
            .with_header("accept", "*/*")?
            .with_json_body(params)?;
        let response = self.client.execute_raw(cancel, request).await?;

        Ok(response.body)
    }

    /// Exports data into `writer` and returns the number of bytes written.
    ///
    /// Nothing is written unless the export succeeds.
    ///
    /// # Errors
    ///
    /// Any error from [`export`](Self::export), or [`Error::Io`] if writing fails.
    pub async fn export_to_writer<W>(
        &self,
        cancel: &CancellationToken,
        params: &ExportParams,
        writer: &mut W,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let data = self.export(cancel, params).await?;
        writer.write_all(&data).await?;
        writer.flush().await?;
        Ok(data.len() as u64)
    }

    /// Creates a scheduled report. `name` and `schedule` are required.
    pub async fn schedule_report(
        &self,
        cancel: &CancellationToken,
        params: &ReportScheduleParams,
    ) -> Result<ScheduledReport> {
        params.validate()?;

        let request = RequestDescriptor::new(Method::POST, SCHEDULE_PATH).with_json_body(params)?;
        self.client.execute(cancel, request).await
    }

    /// Fetches one scheduled report by id.
    pub async fn get_scheduled_report(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> Result<ScheduledReport> {
        require(id, "id")?;

        let request = RequestDescriptor::new(Method::GET, SCHEDULE_PATH).segment(id);
        self.client.execute(cancel, request).await
    }

    /// Lists every scheduled report.
    pub async fn list_scheduled_reports(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ScheduledReport>> {
        let request = RequestDescriptor::new(Method::GET, SCHEDULE_PATH);
        self.client.execute(cancel, request).await
    }

    /// Replaces a scheduled report's definition.
    pub async fn update_scheduled_report(
        &self,
        cancel: &CancellationToken,
        id: &str,
        params: &ReportScheduleParams,
    ) -> Result<ScheduledReport> {
        require(id, "id")?;
        params.validate()?;

        let request = RequestDescriptor::new(Method::PUT, SCHEDULE_PATH)
            .segment(id)
            .with_json_body(params)?;
        self.client.execute(cancel, request).await
    }

    /// Deletes a scheduled report.
    pub async fn delete_scheduled_report(&self, cancel: &CancellationToken, id: &str) -> Result<()> {
        require(id, "id")?;

        let request = RequestDescriptor::new(Method::DELETE, SCHEDULE_PATH).segment(id);
        self.client.execute_empty(cancel, request).await
    }

    /// Runs a scheduled report now, outside its schedule.
    pub async fn trigger_scheduled_report(&self, cancel: &CancellationToken, id: &str) -> Result<()> {
        require(id, "id")?;

        let request = RequestDescriptor::new(Method::POST, SCHEDULE_PATH)
            .segment(id)
            .segment("trigger");
        self.client.execute_empty(cancel, request).await
    }
}
