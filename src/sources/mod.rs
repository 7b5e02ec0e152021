//! Search providers with a shared trait-based interface.
//!
//! This module defines the [`SearchProvider`] trait that every search index
//! implements. All providers return the same [`Record`] shape, so the tool
//! dispatcher and the conversational layer stay provider-agnostic.
//!
//! Two providers ship with the crate:
//!
//! - [`ArxivProvider`] - scholarly index, supports submission-date ranges
//! - [`WikipediaProvider`] - encyclopedia index
//!
//! [`MockProvider`] returns canned records and is meant for tests.

mod arxiv;
pub mod mock;
mod wikipedia;

pub use arxiv::ArxivProvider;
pub use mock::MockProvider;
pub use wikipedia::WikipediaProvider;

use async_trait::async_trait;

use crate::error::ErrorKind;
use crate::models::{Record, SearchOptions};

bitflags::bitflags! {
    /// Capabilities that a provider can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProviderCapabilities: u32 {
        const SEARCH = 1 << 0;
        const DATE_RANGE = 1 << 1;
    }
}

/// The SearchProvider trait defines the interface for all search indexes.
///
/// # Implementing a New Provider
///
/// 1. Create a struct that implements `SearchProvider`
/// 2. Implement `id`, `name` and `search`
/// 3. Report [`ProviderCapabilities::DATE_RANGE`] only if the upstream can
///    bound queries by date; otherwise date bounds are ignored
#[async_trait]
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this provider (e.g. "arxiv", "wikipedia")
    fn id(&self) -> &str;

    /// Human-readable name of this provider
    fn name(&self) -> &str;

    /// Describe the capabilities of this provider
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::SEARCH
    }

    /// Whether date bounds in [`SearchOptions`] are honoured
    fn supports_date_range(&self) -> bool {
        self.capabilities()
            .contains(ProviderCapabilities::DATE_RANGE)
    }

    /// Search the index, returning records in upstream order
    async fn search(&self, options: &SearchOptions) -> Result<Vec<Record>, SourceError>;
}

/// Errors that can occur when querying a provider
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Unreachable service, timeout, or non-success status
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Payload could not be parsed into the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl SourceError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            SourceError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::MalformedResponse(err.to_string())
        } else {
            SourceError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::MalformedResponse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::MalformedResponse(format!("XML: {}", err))
    }
}
