//! Request and result models for search, download and extraction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// First year the scholarly index accepts submissions for
pub const EARLIEST_SUBMISSION: (i32, u32, u32) = (1991, 1, 1);

/// Search parameters handed to a [`SearchProvider`](crate::sources::SearchProvider)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Free-text query
    pub query: String,

    /// Maximum number of records to return (at least 1)
    pub max_results: usize,

    /// Inclusive lower bound on the submission date
    pub start_date: Option<NaiveDate>,

    /// Inclusive upper bound on the submission date
    pub end_date: Option<NaiveDate>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: 10,
            start_date: None,
            end_date: None,
        }
    }
}

impl SearchOptions {
    /// Create new search options
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results; values below 1 are raised to 1
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max.max(1);
        self
    }

    /// Set the inclusive start date
    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Set the inclusive end date
    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Whether any date bound was given
    pub fn has_date_range(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// Resolve the date bounds into a closed range.
    ///
    /// A missing start falls back to the earliest submission date and a
    /// missing end to `today`. Returns `None` when no bound was given.
    pub fn date_range(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        if !self.has_date_range() {
            return None;
        }

        let (year, month, day) = EARLIEST_SUBMISSION;
        let earliest = NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN);

        Some((
            self.start_date.unwrap_or(earliest),
            self.end_date.unwrap_or(today),
        ))
    }

    /// Check the options for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.max_results == 0 {
            return Err("max_results must be at least 1".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(format!("start_date {} is after end_date {}", start, end));
            }
        }
        Ok(())
    }
}

/// Request for storing a document from a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    /// Where to fetch the document from
    pub source_url: String,

    /// Name supplied by the caller; sanitized before use
    pub requested_filename: String,
}

impl DownloadRequest {
    /// Create a new download request
    pub fn new(source_url: impl Into<String>, requested_filename: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            requested_filename: requested_filename.into(),
        }
    }
}

/// How a document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStrategy {
    /// The URL points straight at a binary document
    Direct,
    /// The URL points at a page that is rendered into a document
    Rendered,
}

impl std::fmt::Display for DownloadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadStrategy::Direct => write!(f, "direct"),
            DownloadStrategy::Rendered => write!(f, "rendered"),
        }
    }
}

/// A document written into the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Full path of the stored document
    pub path: PathBuf,

    /// Name of the document inside the store
    pub sanitized_name: String,

    /// Number of bytes written
    pub bytes: u64,

    /// Strategy used to obtain the document
    pub strategy: DownloadStrategy,
}

/// Text extracted from a stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    /// Document the text was read from
    pub source_file: PathBuf,

    /// Extracted text in reading order
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_search_options_builder() {
        let options = SearchOptions::new("transformer")
            .max_results(0)
            .start_date(date(2017, 1, 1));

        assert_eq!(options.query, "transformer");
        assert_eq!(options.max_results, 1);
        assert!(options.has_date_range());
    }

    #[test]
    fn test_date_range_fills_open_bounds() {
        let today = date(2024, 5, 1);

        let none = SearchOptions::new("q");
        assert_eq!(none.date_range(today), None);

        let from = SearchOptions::new("q").start_date(date(2020, 1, 1));
        assert_eq!(from.date_range(today), Some((date(2020, 1, 1), today)));

        let until = SearchOptions::new("q").end_date(date(2000, 12, 31));
        assert_eq!(
            until.date_range(today),
            Some((date(1991, 1, 1), date(2000, 12, 31)))
        );
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let options = SearchOptions::new("q")
            .start_date(date(2022, 1, 1))
            .end_date(date(2021, 1, 1));
        assert!(options.validate().is_err());

        let options = SearchOptions::new("q")
            .start_date(date(2021, 1, 1))
            .end_date(date(2021, 1, 1));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_stored_file_serialization() {
        let stored = StoredFile {
            path: PathBuf::from("/tmp/PDFs/attn.pdf"),
            sanitized_name: "attn.pdf".to_string(),
            bytes: 42,
            strategy: DownloadStrategy::Rendered,
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["sanitizedName"], "attn.pdf");
        assert_eq!(value["strategy"], "rendered");
    }
}
