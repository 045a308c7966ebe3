use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("gosub-request/", env!("CARGO_PKG_VERSION"));

/// Maximum number of bytes captured from an error response body.
pub const DEFAULT_ERROR_BODY_LIMIT: usize = 4096;

/// Configuration for the reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string sent with every request that does not set its own
    pub user_agent: String,
    /// Timeout for establishing a connection
    pub connect_timeout: Option<Duration>,
    /// Timeout for a whole exchange, including reading the body
    pub timeout: Option<Duration>,
    /// How long idle pooled connections are kept around
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host in the pool
    pub pool_max_idle_per_host: usize,
    /// Transparently decompress gzip responses
    pub gzip: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Some(Duration::from_secs(30)),
            timeout: None,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            gzip: true,
        }
    }
}
