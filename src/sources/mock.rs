//! Mock provider for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{Record, SearchOptions};
use crate::sources::{ProviderCapabilities, SearchProvider, SourceError};

/// A provider that returns predefined records and counts its invocations.
#[derive(Debug)]
pub struct MockProvider {
    id: String,
    capabilities: ProviderCapabilities,
    records: Mutex<Vec<Record>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
    last_options: Mutex<Option<SearchOptions>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockProvider {
    /// Create a new mock provider with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capabilities: ProviderCapabilities::SEARCH,
            records: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// Override the reported capabilities
    pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Records returned by every search
    pub fn with_records(self, records: Vec<Record>) -> Self {
        self.set_records(records);
        self
    }

    /// Replace the canned records.
    pub fn set_records(&self, records: Vec<Record>) {
        if let Ok(mut guard) = self.records.lock() {
            *guard = records;
        }
    }

    /// Make every search fail with `UpstreamUnavailable`
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut guard) = self.failure.lock() {
            *guard = Some(message.into());
        }
    }

    /// Number of times `search` was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent search
    pub fn last_options(&self) -> Option<SearchOptions> {
        self.last_options.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<Record>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_options.lock() {
            *guard = Some(options.clone());
        }

        if let Some(message) = self.failure.lock().ok().and_then(|guard| guard.clone()) {
            return Err(SourceError::UpstreamUnavailable(message));
        }

        let records = self
            .records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        Ok(records.into_iter().take(options.max_results).collect())
    }
}

/// Helper function to create a record for testing.
pub fn make_record(title: &str, category: &str) -> Record {
    Record::new(title, format!("http://example.com/{}", title.replace(' ', "_")))
        .summary(format!("Summary of {}", title))
        .published_date("2024-01-01T00:00:00Z")
        .category(category)
}
