//! Download strategy selection and document fetching.

use std::sync::Arc;

use url::Url;

use crate::config::{Config, DownloadConfig};
use crate::documents::{DocumentStore, PageRenderer, TextPdfRenderer};
use crate::error::ErrorKind;
use crate::models::{DownloadRequest, DownloadStrategy, StoredFile};
use crate::utils::{checked_filename, HttpClient, SanitizeError};

/// Hosts whose `/abs/<id>` landing pages have a `/pdf/<id>` counterpart
const ARXIV_HOSTS: &[&str] = &["arxiv.org", "www.arxiv.org", "export.arxiv.org"];

/// Errors that can occur while storing a document
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Sanitization(#[from] SanitizeError),
}

impl DownloadError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::Transfer(_) => ErrorKind::TransferError,
            DownloadError::Render(_) => ErrorKind::RenderError,
            DownloadError::Sanitization(_) => ErrorKind::SanitizationError,
        }
    }
}

/// A fetched HTTP body together with its declared content type
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchedBody {
    /// Whether the server declared the body as a PDF
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().starts_with("application/pdf"))
            .unwrap_or(false)
    }

    /// Whether the server declared the body as HTML
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("html"))
            .unwrap_or(false)
    }
}

/// GET `url`, refusing bodies larger than `max_bytes`
pub async fn fetch_limited(
    client: &HttpClient,
    url: &Url,
    max_bytes: u64,
) -> Result<FetchedBody, DownloadError> {
    let mut response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| DownloadError::Transfer(format!("Failed to fetch {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Transfer(format!(
            "{} returned status: {}",
            url, status
        )));
    }

    if let Some(length) = response.content_length() {
        if length > max_bytes {
            return Err(DownloadError::Transfer(format!(
                "{} is {} bytes, limit is {}",
                url, length, max_bytes
            )));
        }
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| DownloadError::Transfer(format!("Failed to read {}: {}", url, e)))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_bytes {
            return Err(DownloadError::Transfer(format!(
                "{} exceeds the {} byte limit",
                url, max_bytes
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(FetchedBody {
        bytes,
        content_type,
    })
}

/// Resolves a URL plus requested filename into a document in the store.
///
/// Sole writer of the [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Arc<HttpClient>,
    store: DocumentStore,
    renderer: Arc<dyn PageRenderer>,
    direct_hosts: Vec<String>,
    max_bytes: u64,
}

impl Downloader {
    /// Build a downloader with the default page renderer
    pub fn new(config: &Config) -> Result<Self, DownloadError> {
        let client = HttpClient::from_config(&config.http, config.downloads.timeout_secs)
            .map_err(|e| DownloadError::Transfer(format!("Failed to build HTTP client: {}", e)))?;
        let client = Arc::new(client);

        let renderer = Arc::new(TextPdfRenderer::new(
            client.clone(),
            max_bytes(&config.downloads),
        ));

        Ok(Self::with_parts(
            client,
            DocumentStore::new(config.store.root.clone()),
            renderer,
            &config.downloads,
        ))
    }

    /// Assemble a downloader from explicit parts (for testing)
    pub fn with_parts(
        client: Arc<HttpClient>,
        store: DocumentStore,
        renderer: Arc<dyn PageRenderer>,
        config: &DownloadConfig,
    ) -> Self {
        Self {
            client,
            store,
            renderer,
            direct_hosts: config
                .direct_hosts
                .iter()
                .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            max_bytes: max_bytes(config),
        }
    }

    /// The store this downloader writes into
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Decide how a URL is fetched.
    ///
    /// Direct when the host is a configured direct host (or a subdomain of
    /// one) or the path names a `.pdf`; rendered otherwise.
    pub fn classify(&self, url: &Url) -> DownloadStrategy {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let direct_host = self
            .direct_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)));

        if direct_host || url.path().to_ascii_lowercase().ends_with(".pdf") {
            DownloadStrategy::Direct
        } else {
            DownloadStrategy::Rendered
        }
    }

    /// Fetch the document and store it under its sanitized name
    pub async fn download(&self, request: &DownloadRequest) -> Result<StoredFile, DownloadError> {
        let url = parse_source_url(&request.source_url)?;
        let sanitized_name = checked_filename(&request.requested_filename)?;
        let strategy = self.classify(&url);

        tracing::info!(
            url = %url,
            file = %sanitized_name,
            %strategy,
            "downloading document"
        );

        let bytes = match strategy {
            DownloadStrategy::Direct => {
                let target = direct_document_url(&url);
                if target != url {
                    tracing::debug!(from = %url, to = %target, "rewrote abstract link");
                }
                let body = fetch_limited(&self.client, &target, self.max_bytes).await?;
                if body.bytes.is_empty() {
                    return Err(DownloadError::Transfer(format!(
                        "{} returned an empty body",
                        target
                    )));
                }
                body.bytes
            }
            DownloadStrategy::Rendered => {
                self.renderer
                    .render(&url, &request.requested_filename)
                    .await?
            }
        };

        let size = bytes.len() as u64;
        let path = self
            .store
            .write(&sanitized_name, bytes)
            .await
            .map_err(|e| {
                DownloadError::Transfer(format!("Failed to store {}: {}", sanitized_name, e))
            })?;

        tracing::info!(path = %path.display(), bytes = size, "document stored");

        Ok(StoredFile {
            path,
            sanitized_name,
            bytes: size,
            strategy,
        })
    }
}

fn max_bytes(config: &DownloadConfig) -> u64 {
    config.max_file_size_mb.max(1).saturating_mul(1024 * 1024)
}

fn parse_source_url(raw: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| DownloadError::Transfer(format!("Invalid URL {:?}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DownloadError::Transfer(format!(
            "Unsupported URL scheme: {}",
            other
        ))),
    }
}

/// Map an arXiv abstract page onto the paper itself
fn direct_document_url(url: &Url) -> Url {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !ARXIV_HOSTS.contains(&host.as_str()) {
        return url.clone();
    }

    match url.path().strip_prefix("/abs/") {
        Some(id) if !id.is_empty() => {
            let mut rewritten = url.clone();
            rewritten.set_path(&format!("/pdf/{}", id));
            rewritten
        }
        _ => url.clone(),
    }
}
