//! Oracle errors

/// Failure reaching or reading the text-generation oracle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// Client is missing required configuration (API key, base URL)
    #[error("oracle not configured: {0}")]
    NotConfigured(String),

    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("oracle request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Rate limited by the provider
    #[error("rate limited by oracle")]
    RateLimited,

    /// Non-success HTTP status
    #[error("oracle returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response envelope could not be read
    #[error("unreadable oracle response: {0}")]
    Parse(String),

    /// Response carried no content
    #[error("oracle returned an empty completion")]
    Empty,
}

impl OracleError {
    /// Whether retrying the same request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } | Self::RateLimited => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
