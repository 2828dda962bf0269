//! Main error type for the assistant core.

use std::time::Duration;
use thiserror::Error;

use super::categories::*;

/// Result type alias for assistant-core operations.
pub type GeminiResult<T> = Result<T, GeminiError>;

/// Top-level error type for the assistant core.
#[derive(Error, Debug, Clone)]
pub enum GeminiError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Rate limit error.
    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Server error.
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Response error.
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// Resource error.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// The circuit breaker is rejecting calls.
    #[error("Circuit open: next attempt allowed in {retry_in:?}")]
    CircuitOpen {
        /// Time remaining until the breaker admits a probe call.
        retry_in: Duration,
    },

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// An error that could not be classified.
    #[error("Unknown error: {message}")]
    Unknown {
        /// The original error text.
        message: String,
    },
}

impl GeminiError {
    /// Returns true if this error is retryable.
    ///
    /// Errors without an inherent retryability (e.g. `Unknown`) return
    /// false here; the retry layer may still retry them when their
    /// message matches a configured retryable code.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GeminiError::RateLimit(_)
                | GeminiError::Network(NetworkError::Timeout { .. })
                | GeminiError::Network(NetworkError::ConnectionFailed { .. })
                | GeminiError::Server(ServerError::Internal { .. })
                | GeminiError::Server(ServerError::Unavailable { .. })
                | GeminiError::Server(ServerError::ModelOverloaded { .. })
        )
    }

    /// Returns the server-suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GeminiError::RateLimit(e) => e.retry_after(),
            GeminiError::Server(ServerError::Unavailable { retry_after }) => *retry_after,
            _ => None,
        }
    }

    /// Returns a stable machine-readable code for this error.
    ///
    /// Consumers match on these strings (diagnostic panels, the retry
    /// gate's `retryable_error_codes` set), so they must not change.
    pub fn code(&self) -> &'static str {
        match self {
            GeminiError::Configuration(ConfigurationError::ContextWindowTooSmall { .. }) => {
                "CONTEXT_WINDOW_TOO_SMALL"
            }
            GeminiError::Configuration(_) => "INVALID_REQUEST",
            GeminiError::Authentication(_) => "AUTH_FAILURE",
            GeminiError::Request(_) => "INVALID_REQUEST",
            GeminiError::RateLimit(_) => "RATE_LIMIT_EXCEEDED",
            GeminiError::Network(NetworkError::Timeout { .. }) => "TIMEOUT",
            GeminiError::Network(_) => "NETWORK_ERROR",
            GeminiError::Server(ServerError::Internal { .. }) => "INTERNAL",
            GeminiError::Server(_) => "UNAVAILABLE",
            GeminiError::Response(_) => "INVALID_RESPONSE",
            GeminiError::Resource(ResourceError::ModelNotFound { .. }) => "MODEL_NOT_FOUND",
            GeminiError::Resource(ResourceError::ModelUnavailable { .. }) => "MODEL_UNAVAILABLE",
            GeminiError::CircuitOpen { .. } => "CIRCUIT_OPEN",
            GeminiError::Cancelled => "CANCELLED",
            GeminiError::Unknown { .. } => "UNKNOWN_ERROR",
        }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeminiError::Network(NetworkError::Timeout {
                duration: Duration::from_secs(0), // actual deadline unknown here
            })
        } else {
            GeminiError::Network(NetworkError::ConnectionFailed {
                message: err.to_string(),
            })
        }
    }
}

impl From<serde_json::Error> for GeminiError {
    fn from(err: serde_json::Error) -> Self {
        GeminiError::Response(ResponseError::Deserialization {
            message: err.to_string(),
        })
    }
}

impl From<url::ParseError> for GeminiError {
    fn from(err: url::ParseError) -> Self {
        GeminiError::Configuration(ConfigurationError::InvalidBaseUrl {
            url: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        let rate_limit = GeminiError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: Some(Duration::from_secs(30)),
        });
        assert!(rate_limit.is_retryable());

        let auth_error = GeminiError::Authentication(AuthenticationError::InvalidApiKey);
        assert!(!auth_error.is_retryable());

        let internal = GeminiError::Server(ServerError::Internal {
            message: "boom".into(),
        });
        assert!(internal.is_retryable());

        let unknown = GeminiError::Unknown {
            message: "something odd".into(),
        };
        assert!(!unknown.is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let rate_limit = GeminiError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: Some(Duration::from_secs(30)),
        });
        assert_eq!(rate_limit.retry_after(), Some(Duration::from_secs(30)));

        let config_error = GeminiError::Configuration(ConfigurationError::MissingApiKey);
        assert_eq!(config_error.retry_after(), None);
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            GeminiError::RateLimit(RateLimitError::QuotaExceeded { retry_after: None }).code(),
            "RATE_LIMIT_EXCEEDED"
        );
        assert_eq!(
            GeminiError::Server(ServerError::Internal { message: "x".into() }).code(),
            "INTERNAL"
        );
        assert_eq!(
            GeminiError::Server(ServerError::Unavailable { retry_after: None }).code(),
            "UNAVAILABLE"
        );
        assert_eq!(
            GeminiError::Request(RequestError::InvalidModel { model: "m".into() }).code(),
            "INVALID_REQUEST"
        );
        assert_eq!(GeminiError::Cancelled.code(), "CANCELLED");
        assert_eq!(
            GeminiError::Unknown { message: "x".into() }.code(),
            "UNKNOWN_ERROR"
        );
    }

    #[test]
    fn test_auth_error_mentions_api_key() {
        let err = GeminiError::Authentication(AuthenticationError::InvalidApiKey);
        assert!(err.to_string().contains("check your API key"));
    }
}
