use thiserror::Error;

/// Per-URL failure. Every variant is contained to the entry of the URL that
/// produced it; none of them aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("timeout: {message}")]
    Timeout { message: String },
    #[error("invalid url: {message}")]
    InvalidUrl { message: String },
    #[error("non-success status {0}")]
    NonSuccessStatus(u16),
    #[error("response too large (max {max_bytes}, actual {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("decode error: {message}")]
    Decode { message: String },
    #[error("title field not found or is not a string")]
    FieldNotFound,
    #[error("unsupported kind: url must end in .json or .html")]
    UnsupportedKind,
    #[error("cancelled while waiting for the rate limiter")]
    Cancelled,
}

impl ScrapeError {
    pub fn network(message: impl Into<String>) -> Self {
        ScrapeError::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ScrapeError::Decode {
            message: message.into(),
        }
    }

    /// Transport-level failures: the request never produced a usable response.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ScrapeError::Network { .. } | ScrapeError::Timeout { .. } | ScrapeError::InvalidUrl { .. }
        )
    }
}
