//! Filename sanitization for the document store.
//!
//! Filenames arrive from the user or from the model and are used verbatim as
//! keys into a flat directory, so they are reduced to a small, stable alphabet
//! before they ever touch the file system.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Suffix forced onto every stored document, whatever its actual content type
pub const STORED_SUFFIX: &str = ".pdf";

/// Sanitization error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("filename {0:?} is empty after sanitization")]
    EmptyName(String),
}

fn pdf_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\.pdf").expect("static regex"))
}

fn disallowed_chars_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("static regex"))
}

fn whitespace_run_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Reduce an arbitrary filename to its sanitized stem (without the suffix).
///
/// The stem only ever contains `[a-z0-9_-]` and may be empty.
pub fn sanitize_stem(name: &str) -> String {
    let without_suffix = pdf_suffix_pattern().replace_all(name, "");
    let allowed = disallowed_chars_pattern().replace_all(&without_suffix, "");
    let lowered = allowed.trim().to_lowercase();
    whitespace_run_pattern()
        .replace_all(&lowered, "_")
        .into_owned()
}

/// Sanitize a filename into the name used inside the document store.
///
/// Lower-cases, removes everything outside word characters, whitespace and
/// hyphens, collapses whitespace runs into a single underscore and forces a
/// `.pdf` suffix. The function is idempotent.
///
/// # Examples
///
/// ```
/// use research_librarian::utils::sanitize_filename;
///
/// assert_eq!(
///     sanitize_filename("Attention Is All You Need"),
///     "attention_is_all_you_need.pdf"
/// );
/// ```
pub fn sanitize_filename(name: &str) -> String {
    format!("{}{}", sanitize_stem(name), STORED_SUFFIX)
}

/// Like [`sanitize_filename`], but rejects names whose stem is empty.
pub fn checked_filename(name: &str) -> Result<String, SanitizeError> {
    let stem = sanitize_stem(name);
    if stem.is_empty() {
        return Err(SanitizeError::EmptyName(name.to_string()));
    }
    Ok(format!("{}{}", stem, STORED_SUFFIX))
}
