//! Text extraction from stored documents.

use crate::documents::DocumentStore;
use crate::error::ErrorKind;
use crate::models::ExtractedText;
use crate::utils::{checked_filename, html_to_text, looks_like_html};

/// Errors that can occur during text extraction
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("No stored document named {0:?}")]
    NotFound(String),

    #[error("Failed to extract text: {0}")]
    Extraction(String),
}

impl ExtractError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::NotFound(_) => ErrorKind::NotFound,
            ExtractError::Extraction(_) => ErrorKind::ExtractionError,
        }
    }
}

/// Reads documents back out of the store as plain text.
///
/// Nothing is cached; every call re-reads the file.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    store: DocumentStore,
}

impl TextExtractor {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Extract the text of the document stored under `filename`
    ///
    /// `filename` goes through the same sanitization as downloads, so the
    /// name given to `download_document` finds the document again.
    pub async fn extract(&self, filename: &str) -> Result<ExtractedText, ExtractError> {
        let sanitized = checked_filename(filename)
            .map_err(|_| ExtractError::NotFound(filename.to_string()))?;

        if !self.store.contains(&sanitized).await {
            return Err(ExtractError::NotFound(sanitized));
        }

        let path = self.store.path_for(&sanitized);
        let bytes = self.store.read(&sanitized).await.map_err(|e| {
            ExtractError::Extraction(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let text = if is_pdf(&bytes) {
            extract_pdf(bytes).await?
        } else {
            let body = String::from_utf8_lossy(&bytes);
            if looks_like_html(&body) {
                html_to_text(&body)
            } else {
                body.into_owned()
            }
        };

        if text.trim().is_empty() {
            tracing::warn!(
                file = %sanitized,
                "no text extracted, document may be scanned or image-only"
            );
        } else {
            tracing::info!(file = %sanitized, chars = text.len(), "text extracted");
        }

        Ok(ExtractedText {
            source_file: path,
            text,
        })
    }
}

/// `%PDF` at the start of the file, after an optional BOM and whitespace
fn is_pdf(bytes: &[u8]) -> bool {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(b"%PDF")
}

/// Run the PDF parser on a blocking thread; a panic inside it is reported
/// as an extraction failure.
async fn extract_pdf(bytes: Vec<u8>) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractError::Extraction(format!("PDF parser aborted: {}", e)))?
        .map_err(|e| ExtractError::Extraction(e.to_string()))
}
