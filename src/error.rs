//! Error types for the orderbook-feed crate.
//!
//! Malformed frames and sequence gaps are not errors: they are handled
//! inside the feed state. What remains are transport and configuration
//! failures.

/// The main error type for this crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Feed URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration (bad scheme, zero depth, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// WebSocket connection closed unexpectedly, or reconnect attempts ran out
    #[error("WebSocket connection closed")]
    ConnectionClosed,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
}

impl Error {
    /// Check if the error means the transport is gone and a reconnect is needed
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::WebSocket(_) | Error::ConnectionClosed | Error::Timeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("depth must be at least 1".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn test_url_error_conversion() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(!err.is_disconnect());
    }

    #[test]
    fn test_disconnect_classification() {
        assert!(Error::ConnectionClosed.is_disconnect());
        assert!(Error::Timeout.is_disconnect());
        assert!(!Error::Config(String::new()).is_disconnect());
    }
}
