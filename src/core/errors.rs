use thiserror::Error;

/// Failure of a single REST round trip.
#[derive(Error, Debug)]
pub enum TransportError {
    /// DNS, connect, TLS, timeout or body-read failures
    #[error("Network error: {0}")]
    Network(String),

    /// The request could not be built (bad URL, bad method, bad header value)
    #[error("Request error: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Request(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Failure to turn one inbound frame into bytes or a typed record.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Corrupt gzip frame: {0}")]
    CorruptGzip(#[source] std::io::Error),

    #[error("Invalid UTF-8 in frame: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Subscription to {channel} rejected with status {status:?}")]
    SubscribeRejected { channel: String, status: String },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("API error: {code} - {message}")]
    Api { code: i64, message: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Authentication required but no credentials configured")]
    AuthenticationRequired,

    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    /// Whether a caller-level retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::Network(_)) | Self::Connect(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_retryable() {
        let err = ExchangeError::from(TransportError::Network("connection reset".to_string()));
        assert!(err.is_retryable());

        let err = ExchangeError::from(TransportError::Request("relative URL".to_string()));
        assert!(!err.is_retryable());

        let err = ExchangeError::SubscribeRejected {
            channel: "market_btrusdt_depth_step0".to_string(),
            status: "error".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_api_error_display() {
        let err = ExchangeError::Api {
            code: -1121,
            message: "Invalid symbol.".to_string(),
        };
        assert_eq!(err.to_string(), "API error: -1121 - Invalid symbol.");
    }
}
