//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (research-librarian tool pipeline)"
);

/// Shared HTTP client with sensible defaults
///
/// Every client carries both a total request timeout and a connect timeout;
/// there is no way to build one with an unbounded wait.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with a custom user agent and total timeout
    pub fn with_timeout(user_agent: &str, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        Self::build(user_agent, timeout_secs, 10)
    }

    /// Create a client from the HTTP section of the configuration, overriding
    /// the total timeout for one particular upstream
    pub fn from_config(config: &HttpConfig, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        Self::build(&config.user_agent, timeout_secs, config.connect_timeout_secs)
    }

    fn build(
        user_agent: &str,
        timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        // A zero timeout would make every request fail immediately.
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let connect_timeout = Duration::from_secs(connect_timeout_secs.max(1)).min(timeout);

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }

    /// Total timeout applied to every request made through this client
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_is_clamped() {
        let client = HttpClient::with_timeout("test-agent", 0).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_from_config_uses_override() {
        let config = HttpConfig::default();
        let client = HttpClient::from_config(&config, 7).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(7));
    }
}
