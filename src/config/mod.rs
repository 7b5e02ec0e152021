//! Configuration management.
//!
//! The core components never look at the process environment. The binary
//! builds a [`Config`] through [`load_config`] (defaults, an optional TOML
//! file, then `RESEARCH_LIBRARIAN_*` environment variables) and hands it to
//! [`ToolDispatcher::new`](crate::tools::ToolDispatcher::new).
//!
//! # Configuration File Format
//!
//! ```toml
//! [store]
//! root = "./PDFs"
//!
//! [http]
//! user_agent = "InfoBot/1.0 (https://example.org/infobot)"
//! request_timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [scholarly]
//! api_url = "http://export.arxiv.org/api/query"
//! default_max_results = 10
//!
//! [encyclopedia]
//! api_url = "https://en.wikipedia.org/w/api.php"
//! result_limit = 5
//! timeout_secs = 10
//!
//! [downloads]
//! direct_hosts = ["arxiv.org"]
//! timeout_secs = 60
//! max_file_size_mb = 100
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Environment overrides use `__` between section and key, e.g.
//! `RESEARCH_LIBRARIAN_STORE__ROOT=/data/pdfs`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix understood by [`load_config`]
pub const ENV_PREFIX: &str = "RESEARCH_LIBRARIAN";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Settings shared by every outbound HTTP client
    #[serde(default)]
    pub http: HttpConfig,

    /// Scholarly index (arXiv) settings
    #[serde(default)]
    pub scholarly: ScholarlyConfig,

    /// Encyclopedia index (Wikipedia) settings
    #[serde(default)]
    pub encyclopedia: EncyclopediaConfig,

    /// Download strategy settings
    #[serde(default)]
    pub downloads: DownloadConfig,

    /// Logging settings, consumed by the binary only
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Flat directory holding downloaded documents
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./PDFs")
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Caller-identifying user agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Total timeout for requests that have no dedicated setting
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_user_agent() -> String {
    crate::utils::DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Scholarly index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarlyConfig {
    /// Query endpoint of the arXiv API
    #[serde(default = "default_arxiv_url")]
    pub api_url: String,

    /// Result cap used when a tool call does not specify one
    #[serde(default = "default_scholarly_results")]
    pub default_max_results: usize,
}

impl Default for ScholarlyConfig {
    fn default() -> Self {
        Self {
            api_url: default_arxiv_url(),
            default_max_results: default_scholarly_results(),
        }
    }
}

fn default_arxiv_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_scholarly_results() -> usize {
    10
}

/// Encyclopedia index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncyclopediaConfig {
    /// MediaWiki API endpoint
    #[serde(default = "default_wikipedia_url")]
    pub api_url: String,

    /// Fixed `srlimit` sent with every search
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Total timeout for encyclopedia requests
    #[serde(default = "default_encyclopedia_timeout")]
    pub timeout_secs: u64,
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            api_url: default_wikipedia_url(),
            result_limit: default_result_limit(),
            timeout_secs: default_encyclopedia_timeout(),
        }
    }
}

fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_result_limit() -> usize {
    5
}

fn default_encyclopedia_timeout() -> u64 {
    10
}

/// Download configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Hosts (and their subdomains) that serve documents directly
    #[serde(default = "default_direct_hosts")]
    pub direct_hosts: Vec<String>,

    /// Total timeout for fetching a document or a page to render
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,

    /// Maximum file size for downloads (in MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            direct_hosts: default_direct_hosts(),
            timeout_secs: default_download_timeout(),
            max_file_size_mb: default_max_file_size(),
        }
    }
}

fn default_direct_hosts() -> Vec<String> {
    vec!["arxiv.org".to_string()]
}

fn default_download_timeout() -> u64 {
    60
}

fn default_max_file_size() -> u64 {
    100
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"json"` for structured output, anything else for human-readable
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("downloads.direct_hosts")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
