//! Core data models for search results and document operations.

mod record;
mod request;

pub use record::Record;
pub use request::{
    DownloadRequest, DownloadStrategy, ExtractedText, SearchOptions, StoredFile,
    EARLIEST_SUBMISSION,
};
