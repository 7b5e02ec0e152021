//! Tool handlers: thin adapters from validated JSON arguments onto the
//! providers, the downloader and the extractor.

use std::sync::Arc;

use serde_json::Value;

use super::schema::parse_date;
use super::{ToolError, ToolHandler};
use crate::documents::{Downloader, TextExtractor};
use crate::models::{DownloadRequest, SearchOptions};
use crate::sources::SearchProvider;

fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required field `{}`", name)))
}

fn optional_usize(args: &Value, name: &str, default: usize) -> usize {
    args.get(name)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(default)
}

/// Runs a search against one provider
#[derive(Debug)]
pub struct SearchHandler {
    pub provider: Arc<dyn SearchProvider>,
    pub default_max_results: usize,

    /// Whether the tool declares `start_date`/`end_date`; otherwise they are ignored
    pub accepts_dates: bool,
}

impl SearchHandler {
    fn options(&self, args: &Value) -> Result<SearchOptions, ToolError> {
        let mut options = SearchOptions::new(required_str(args, "query")?.trim())
            .max_results(optional_usize(args, "max_results", self.default_max_results));

        for (name, is_start) in [("start_date", true), ("end_date", false)] {
            if !self.accepts_dates {
                break;
            }
            if let Some(value) = args.get(name).filter(|v| !v.is_null()) {
                let date = parse_date(name, value).map_err(ToolError::InvalidArguments)?;
                options = if is_start {
                    options.start_date(date)
                } else {
                    options.end_date(date)
                };
            }
        }

        options.validate().map_err(ToolError::InvalidArguments)?;
        Ok(options)
    }
}

#[async_trait::async_trait]
impl ToolHandler for SearchHandler {
    async fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let options = self.options(args)?;

        if options.has_date_range() && !self.provider.supports_date_range() {
            tracing::debug!(
                provider = self.provider.id(),
                "provider has no date filter, ignoring date range"
            );
        }

        let records = self.provider.search(&options).await?;
        Ok(serde_json::to_value(records)?)
    }
}

/// Stores a document from a URL
#[derive(Debug)]
pub struct DownloadHandler {
    pub downloader: Arc<Downloader>,
}

#[async_trait::async_trait]
impl ToolHandler for DownloadHandler {
    async fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let request = DownloadRequest::new(
            required_str(args, "url")?.trim(),
            required_str(args, "filename")?,
        );

        let stored = self.downloader.download(&request).await?;
        Ok(serde_json::to_value(stored)?)
    }
}

/// Extracts the text of a stored document
#[derive(Debug)]
pub struct ExtractHandler {
    pub extractor: Arc<TextExtractor>,
}

#[async_trait::async_trait]
impl ToolHandler for ExtractHandler {
    async fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let extracted = self
            .extractor
            .extract(required_str(args, "filename")?)
            .await?;
        Ok(serde_json::to_value(extracted)?)
    }
}
