//! Record model representing a normalized search result from any provider.

use serde::{Deserialize, Serialize};

/// A normalized search result
///
/// Every provider returns this same shape so the dispatcher and the
/// conversational layer never need to know where a result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Result title
    pub title: String,

    /// Canonical link to the result
    pub link: String,

    /// Abstract or snippet text, free of markup
    pub summary: String,

    /// Publication (or last edit) date as reported upstream
    pub published_date: String,

    /// Primary classification; empty for providers without one
    pub category: String,
}

impl Record {
    /// Create a new record with the required fields
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            summary: String::new(),
            published_date: String::new(),
            category: String::new(),
        }
    }

    /// Set the summary
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set the publication date
    pub fn published_date(mut self, date: impl Into<String>) -> Self {
        self.published_date = date.into();
        self
    }

    /// Set the category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}
