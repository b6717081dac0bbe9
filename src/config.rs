//! Retriever configuration constants and options

use std::time::Duration;

/// Default end-to-end request timeout.
/// Binary payloads can be large; 5 minutes covers slow links without letting
/// a dead connection hold a retrieval open forever.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout.
/// Connection establishment should be fast; 10 seconds distinguishes an
/// unreachable host from a slow transfer.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("blobfetch/", env!("CARGO_PKG_VERSION"));

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// End-to-end timeout for one request, including body transfer.
    pub request_timeout: Duration,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl RetrieverConfig {
    /// Create a configuration with default timeouts.
    pub fn new() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set the end-to-end request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the User-Agent header value.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self::new()
    }
}
