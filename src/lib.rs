//! # Research Librarian
//!
//! Tool dispatch and retrieval pipeline for a conversational research agent:
//! search arXiv and Wikipedia, download documents into a flat store and
//! extract their text, all behind a fixed, validated tool-calling contract.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Records, search options and document results
//! - [`sources`]: Search providers behind the [`SearchProvider`] trait
//! - [`documents`]: Download strategy, page rendering, the document store and text extraction
//! - [`tools`]: Tool registry, argument validation, dispatch and slash directives
//! - [`utils`]: Filename sanitization, HTTP client and markup helpers
//! - [`config`]: Configuration management
//! - [`error`]: Failure taxonomy shared by every component
//!
//! ## Example
//!
//! ```no_run
//! use research_librarian::config::Config;
//! use research_librarian::tools::{ToolCall, ToolDispatcher};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = ToolDispatcher::new(&Config::default())?;
//! let call = ToolCall::new("search_scholarly", json!({ "query": "transformer", "max_results": 3 }));
//! let outcome = dispatcher.invoke_outcome(&call).await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod documents;
pub mod error;
pub mod models;
pub mod sources;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use error::ErrorKind;
pub use models::Record;
pub use sources::{SearchProvider, SourceError};
pub use tools::{ToolCall, ToolDispatcher, ToolOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
