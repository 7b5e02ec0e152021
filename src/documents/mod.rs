//! Document download, storage and text extraction.
//!
//! [`Downloader`] is the only writer of the [`DocumentStore`]; it fetches
//! direct document links as-is and hands every other page to a
//! [`PageRenderer`]. [`TextExtractor`] reads stored documents back as text.

mod download;
mod extract;
mod render;
mod store;

pub use download::{fetch_limited, DownloadError, Downloader, FetchedBody};
pub use extract::{ExtractError, TextExtractor};
pub use render::{text_to_pdf, PageRenderer, TextPdfRenderer};
pub use store::DocumentStore;
