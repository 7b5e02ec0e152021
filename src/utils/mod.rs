//! Utility modules supporting the retrieval pipeline.
//!
//! - [`sanitize_filename`]: Turn arbitrary filenames into stable document-store names
//! - [`checked_filename`]: Same, but rejects names that sanitize to nothing
//! - [`HttpClient`]: HTTP client with mandatory timeouts
//! - [`strip_tags`]: Remove markup from HTML fragments
//! - [`html_to_text`]: Convert an HTML page into readable text
//!
//! # Sanitization
//!
//! ```rust
//! use research_librarian::utils::sanitize_filename;
//!
//! let name = sanitize_filename("Attention Is All You Need");
//! assert_eq!(name, "attention_is_all_you_need.pdf");
//! assert_eq!(sanitize_filename(&name), name);
//! ```

mod html;
mod http;
mod sanitize;

pub use html::{html_to_text, looks_like_html, strip_tags, TEXT_WIDTH};
pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use sanitize::{
    checked_filename, sanitize_filename, sanitize_stem, SanitizeError, STORED_SUFFIX,
};
