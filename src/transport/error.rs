//! Transport layer error types.

use std::time::Duration;

use crate::error::{GeminiError, NetworkError};

/// Transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established or was dropped.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The request exceeded its deadline.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    /// Anything else that went wrong sending or reading.
    #[error("Request error: {0}")]
    Request(String),
}

impl From<TransportError> for GeminiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(duration) => {
                GeminiError::Network(NetworkError::Timeout { duration })
            }
            TransportError::Connection(message) => {
                GeminiError::Network(NetworkError::ConnectionFailed { message })
            }
            TransportError::Request(message) => {
                GeminiError::Network(NetworkError::ConnectionFailed { message })
            }
        }
    }
}
