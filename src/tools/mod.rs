//! Tool-calling contract exposed to the conversational agent.
//!
//! The agent emits a [`ToolCall`] (name plus JSON arguments). The
//! [`ToolDispatcher`] validates the arguments against the tool's
//! [`ParamSpec`] list, runs the handler and wraps the result in a
//! [`ToolOutput`] whose [`RouteTag`] tells the agent how to present it.

mod dispatcher;
pub mod directives;
mod handlers;
mod schema;

pub use directives::{help_text, Directive, DirectiveError, DirectivePlan, ReasoningTask, SYSTEM_PROMPT};
pub use dispatcher::ToolDispatcher;
pub use handlers::{DownloadHandler, ExtractHandler, SearchHandler};
pub use schema::{object_schema, validate_arguments, ParamKind, ParamSpec};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::documents::{DownloadError, ExtractError};
use crate::error::ErrorKind;
use crate::sources::SourceError;

/// The fixed set of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    SearchScholarly,
    SearchEncyclopedia,
    DownloadDocument,
    ExtractText,
}

impl ToolName {
    /// Every tool, in presentation order
    pub const ALL: [ToolName; 4] = [
        ToolName::SearchScholarly,
        ToolName::SearchEncyclopedia,
        ToolName::DownloadDocument,
        ToolName::ExtractText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SearchScholarly => "search_scholarly",
            ToolName::SearchEncyclopedia => "search_encyclopedia",
            ToolName::DownloadDocument => "download_document",
            ToolName::ExtractText => "extract_text",
        }
    }

    /// How the result of this tool is presented
    pub fn route(&self) -> RouteTag {
        match self {
            ToolName::SearchScholarly | ToolName::SearchEncyclopedia => RouteTag::SearchResults,
            ToolName::DownloadDocument => RouteTag::StoredFile,
            ToolName::ExtractText => RouteTag::DocumentText,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = ToolName::ALL.iter().map(|t| t.as_str()).collect();
                ToolError::InvalidArguments(format!(
                    "unknown tool '{}' (known tools: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Presentation tag attached to every successful result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteTag {
    SearchResults,
    StoredFile,
    DocumentText,
}

impl RouteTag {
    /// Render directive the conversational layer keys on
    pub fn directive(&self) -> &'static str {
        match self {
            RouteTag::SearchResults => "/searchResults",
            RouteTag::StoredFile => "/storedFile",
            RouteTag::DocumentText => "/documentText",
        }
    }
}

/// Errors that can occur when invoking a tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// A result could not be encoded as JSON
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ToolError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            ToolError::Source(e) => e.kind(),
            ToolError::Download(e) => e.kind(),
            ToolError::Extract(e) => e.kind(),
            ToolError::Encode(_) => ErrorKind::MalformedResponse,
        }
    }
}

/// A tool call as emitted by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,

    #[serde(default = "empty_arguments")]
    pub arguments: Value,

    /// Correlation id supplied by the caller, echoed in the outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn empty_arguments() -> Value {
    Value::Object(serde_json::Map::new())
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Build a call from a function-calling response, where the arguments
    /// arrive as a JSON-encoded string
    pub fn from_function_call(name: &str, arguments_json: &str) -> Result<Self, ToolError> {
        let arguments = if arguments_json.trim().is_empty() {
            empty_arguments()
        } else {
            serde_json::from_str(arguments_json).map_err(|e| {
                ToolError::InvalidArguments(format!("{}: arguments are not valid JSON: {}", name, e))
            })?
        };
        Ok(Self::new(name, arguments))
    }
}

/// Successful tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool: ToolName,
    pub route: RouteTag,
    pub data: Value,
}

/// Serialisable result of a tool call, success or failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ToolOutcome {
    Ok {
        tool: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        route: RouteTag,
        directive: String,
        data: Value,
    },
    Error {
        tool: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        kind: ErrorKind,
        message: String,
    },
}

impl ToolOutcome {
    pub fn from_result(call: &ToolCall, result: Result<ToolOutput, ToolError>) -> Self {
        match result {
            Ok(output) => ToolOutcome::Ok {
                tool: output.tool.to_string(),
                id: call.id.clone(),
                route: output.route,
                directive: output.route.directive().to_string(),
                data: output.data,
            },
            Err(err) => ToolOutcome::Error {
                tool: call.name.clone(),
                id: call.id.clone(),
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutcome::Ok { .. })
    }
}

/// A tool the agent can call
#[derive(Clone)]
pub struct Tool {
    pub name: ToolName,

    /// Human-readable description shown to the model
    pub description: String,

    /// Typed parameter list
    pub params: Vec<ParamSpec>,

    /// Handler executing the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish()
    }
}

impl Tool {
    /// JSON Schema for the tool's arguments
    pub fn input_schema(&self) -> Value {
        object_schema(&self.params)
    }

    /// Function-calling definition: `{name, description, parameters}`
    pub fn definition(&self) -> Value {
        serde_json::json!({
            "name": self.name.as_str(),
            "description": self.description,
            "parameters": self.input_schema(),
        })
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + fmt::Debug {
    /// Execute the tool with already validated arguments
    async fn execute(&self, args: &Value) -> Result<Value, ToolError>;
}

/// Registry of the fixed tool set, immutable once built
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<ToolName, Tool>,
}

impl ToolRegistry {
    pub(crate) fn new(tools: Vec<Tool>) -> Self {
        Self {
            tools: tools.into_iter().map(|t| (t.name, t)).collect(),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: ToolName) -> Option<&Tool> {
        self.tools.get(&name)
    }

    /// All tools in presentation order
    pub fn all(&self) -> Vec<&Tool> {
        ToolName::ALL
            .iter()
            .filter_map(|name| self.tools.get(name))
            .collect()
    }
}
