//! Error types for iocrisk-client

use iocrisk_core::TransportError;
use thiserror::Error;

/// Errors raised by the HTTP client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Request could not be sent or the connection failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request exceeded the configured timeout
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Service answered with a non-2xx status
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// Response body was not the expected JSON
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client could not be configured
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status(code) => TransportError::Status(code),
            ClientError::Timeout(secs) => TransportError::Timeout(secs),
            ClientError::Json(e) => TransportError::Decode(e.to_string()),
            ClientError::Http(msg) | ClientError::InvalidConfig(msg) => {
                TransportError::Request(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_transport_status() {
        let err: TransportError = ClientError::Status(503).into();
        assert_eq!(err, TransportError::Status(503));
    }

    #[test]
    fn test_json_maps_to_decode() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TransportError = ClientError::from(json_err).into();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
