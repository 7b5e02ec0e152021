//! Wikipedia encyclopedia index provider.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{EncyclopediaConfig, HttpConfig};
use crate::models::{Record, SearchOptions};
use crate::sources::{SearchProvider, SourceError};
use crate::utils::{strip_tags, HttpClient};

/// Canonical page link; the page id survives renames
const PAGE_LINK_BASE: &str = "https://en.wikipedia.org/?curid=";

/// Wikipedia search provider backed by the MediaWiki `list=search` API
#[derive(Debug, Clone)]
pub struct WikipediaProvider {
    client: Arc<HttpClient>,
    api_url: String,
    result_limit: usize,
}

#[derive(Debug, Deserialize)]
struct WikiResponse {
    query: Option<WikiQuery>,
    error: Option<WikiApiError>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Vec<WikiHit>,
}

#[derive(Debug, Deserialize)]
struct WikiHit {
    title: String,
    pageid: u64,
    #[serde(default)]
    snippet: String,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WikiApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

impl WikipediaProvider {
    /// Create a provider from configuration
    pub fn new(config: &EncyclopediaConfig, http: &HttpConfig) -> Result<Self, SourceError> {
        let client = HttpClient::from_config(http, config.timeout_secs)?;
        Ok(Self::with_client(
            Arc::new(client),
            &config.api_url,
            config.result_limit,
        ))
    }

    /// Create with a custom HTTP client and endpoint (for testing)
    pub fn with_client(
        client: Arc<HttpClient>,
        api_url: impl Into<String>,
        result_limit: usize,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            result_limit: result_limit.max(1),
        }
    }

    fn parse_response(body: &str, max_results: usize) -> Result<Vec<Record>, SourceError> {
        let response: WikiResponse = serde_json::from_str(body)?;

        if let Some(error) = response.error {
            return Err(SourceError::UpstreamUnavailable(format!(
                "Wikipedia API error {}: {}",
                error.code, error.info
            )));
        }

        let query = response
            .query
            .ok_or_else(|| SourceError::MalformedResponse("missing `query` object".to_string()))?;

        Ok(query
            .search
            .into_iter()
            .take(max_results)
            .map(|hit| {
                Record::new(hit.title, format!("{}{}", PAGE_LINK_BASE, hit.pageid))
                    .summary(strip_tags(&hit.snippet))
                    .published_date(hit.timestamp.unwrap_or_default())
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for WikipediaProvider {
    fn id(&self) -> &str {
        "wikipedia"
    }

    fn name(&self) -> &str {
        "Wikipedia"
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<Record>, SourceError> {
        if options.has_date_range() {
            tracing::debug!(
                provider = "wikipedia",
                "date range not supported by this index, ignoring"
            );
        }

        let limit = self.result_limit.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", options.query.as_str()),
                ("srlimit", limit.as_str()),
                ("utf8", "1"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| {
                SourceError::UpstreamUnavailable(format!("Failed to query Wikipedia: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UpstreamUnavailable(format!(
                "Wikipedia API returned status: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            SourceError::UpstreamUnavailable(format!("Failed to read Wikipedia response: {}", e))
        })?;

        let records = Self::parse_response(&body, options.max_results)?;
        tracing::info!(
            provider = "wikipedia",
            query = %options.query,
            results = records.len(),
            "search complete"
        );

        Ok(records)
    }
}
