//! Static dispatcher from tool name to handler.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::handlers::{DownloadHandler, ExtractHandler, SearchHandler};
use super::schema::{validate_arguments, ParamKind, ParamSpec};
use super::{Tool, ToolCall, ToolError, ToolName, ToolOutcome, ToolOutput, ToolRegistry};
use crate::config::Config;
use crate::documents::{DocumentStore, Downloader, TextExtractor};
use crate::sources::{ArxivProvider, SearchProvider, WikipediaProvider};

/// Result cap used by `search_encyclopedia` when the call gives none
const ENCYCLOPEDIA_DEFAULT_RESULTS: usize = 5;

/// Validates tool calls and routes them to their handlers.
///
/// Calls are serialized: a second invocation waits until the first one has
/// completed, even when the dispatcher is shared between tasks.
#[derive(Debug)]
pub struct ToolDispatcher {
    registry: ToolRegistry,
    gate: Mutex<()>,
}

impl ToolDispatcher {
    /// Build the dispatcher with the arXiv and Wikipedia providers
    pub fn new(config: &Config) -> Result<Self, ToolError> {
        let scholarly = ArxivProvider::new(&config.scholarly, &config.http)?;
        let encyclopedia = WikipediaProvider::new(&config.encyclopedia, &config.http)?;
        let downloader = Downloader::new(config)?;
        let extractor = TextExtractor::new(DocumentStore::new(config.store.root.clone()));

        Ok(Self::with_components(
            Arc::new(scholarly),
            Arc::new(encyclopedia),
            Arc::new(downloader),
            Arc::new(extractor),
            config,
        ))
    }

    /// Build the dispatcher from explicit components
    pub fn with_components(
        scholarly: Arc<dyn SearchProvider>,
        encyclopedia: Arc<dyn SearchProvider>,
        downloader: Arc<Downloader>,
        extractor: Arc<TextExtractor>,
        config: &Config,
    ) -> Self {
        let scholarly_default = config.scholarly.default_max_results.max(1);

        let tools = vec![
            Tool {
                name: ToolName::SearchScholarly,
                description: "Search arXiv for scholarly papers on a topic, optionally bounded \
                              by submission date. Returns title, link, summary, publishedDate \
                              and category for each paper."
                    .to_string(),
                params: vec![
                    ParamSpec::required("query", ParamKind::String, "The query to search for."),
                    ParamSpec::optional(
                        "max_results",
                        ParamKind::Integer { minimum: 1 },
                        "The maximum number of results to return.",
                    )
                    .with_default(json!(scholarly_default)),
                    ParamSpec::optional(
                        "start_date",
                        ParamKind::Date,
                        "Earliest submission date, YYYY-MM-DD (inclusive).",
                    ),
                    ParamSpec::optional(
                        "end_date",
                        ParamKind::Date,
                        "Latest submission date, YYYY-MM-DD (inclusive).",
                    ),
                ],
                handler: Arc::new(SearchHandler {
                    provider: scholarly,
                    default_max_results: scholarly_default,
                    accepts_dates: true,
                }),
            },
            Tool {
                name: ToolName::SearchEncyclopedia,
                description: "Search Wikipedia for articles on a topic. Returns title, link and \
                              a plain-text snippet for each article."
                    .to_string(),
                params: vec![
                    ParamSpec::required("query", ParamKind::String, "The query to search for."),
                    ParamSpec::optional(
                        "max_results",
                        ParamKind::Integer { minimum: 1 },
                        "The maximum number of results to return.",
                    )
                    .with_default(json!(ENCYCLOPEDIA_DEFAULT_RESULTS)),
                ],
                handler: Arc::new(SearchHandler {
                    provider: encyclopedia,
                    default_max_results: ENCYCLOPEDIA_DEFAULT_RESULTS,
                    accepts_dates: false,
                }),
            },
            Tool {
                name: ToolName::DownloadDocument,
                description: "Download a document from a URL into the local library. PDF links \
                              are stored as-is, other pages are rendered to PDF."
                    .to_string(),
                params: vec![
                    ParamSpec::required(
                        "url",
                        ParamKind::Url,
                        "The http(s) URL to download the document from.",
                    ),
                    ParamSpec::required(
                        "filename",
                        ParamKind::String,
                        "The name to store the document under, e.g. the paper title.",
                    ),
                ],
                handler: Arc::new(DownloadHandler { downloader }),
            },
            Tool {
                name: ToolName::ExtractText,
                description: "Read a previously downloaded document and return its text."
                    .to_string(),
                params: vec![ParamSpec::required(
                    "filename",
                    ParamKind::String,
                    "The name the document was downloaded under.",
                )],
                handler: Arc::new(ExtractHandler { extractor }),
            },
        ];

        Self {
            registry: ToolRegistry::new(tools),
            gate: Mutex::new(()),
        }
    }

    /// Function-calling definitions of every tool
    pub fn definitions(&self) -> Vec<Value> {
        self.registry.all().into_iter().map(Tool::definition).collect()
    }

    /// Validate and run one tool call
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let tool_name: ToolName = name.parse()?;
        let tool = self.registry.get(tool_name).ok_or_else(|| {
            ToolError::InvalidArguments(format!("tool '{}' is not registered", tool_name))
        })?;

        validate_arguments(tool_name.as_str(), &tool.params, arguments)?;

        let _turn = self.gate.lock().await;
        let started = Instant::now();
        let result = tool.handler.execute(arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(data) => {
                tracing::info!(tool = %tool_name, elapsed_ms, "tool call succeeded");
                Ok(ToolOutput {
                    tool: tool_name,
                    route: tool_name.route(),
                    data,
                })
            }
            Err(err) => {
                tracing::warn!(
                    tool = %tool_name,
                    kind = %err.kind(),
                    elapsed_ms,
                    error = %err,
                    "tool call failed"
                );
                Err(err)
            }
        }
    }

    /// Run a [`ToolCall`]
    pub async fn invoke_call(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        self.invoke(&call.name, &call.arguments).await
    }

    /// Run a [`ToolCall`], folding failures into a serialisable outcome
    pub async fn invoke_outcome(&self, call: &ToolCall) -> ToolOutcome {
        let result = self.invoke_call(call).await;
        if let Err(err) = &result {
            tracing::debug!(tool = %call.name, kind = %err.kind(), "returning error outcome");
        }
        ToolOutcome::from_result(call, result)
    }
}
