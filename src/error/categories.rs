//! Error category types for granular error handling.

use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    /// No API key was provided via the builder or the environment.
    #[error("Missing API key")]
    MissingApiKey,

    /// The base URL could not be parsed.
    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl {
        /// The offending URL string.
        url: String,
    },

    /// The model's reserved token budget exceeds its context window.
    #[error("Context window of {model} too small: reserved tokens exceed the window by {deficit}")]
    ContextWindowTooSmall {
        /// The model whose budget is infeasible.
        model: String,
        /// How many tokens the reservation overshoots the window.
        deficit: u32,
    },

    /// Any other invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the problem.
        message: String,
    },
}

/// Authentication-related errors.
#[derive(Error, Debug, Clone)]
pub enum AuthenticationError {
    /// The API key was rejected.
    #[error("Invalid API key - check your API key")]
    InvalidApiKey,

    /// The API key has expired.
    #[error("API key has expired - check your API key")]
    ExpiredApiKey,

    /// The key is valid but its quota is exhausted.
    #[error("Quota exceeded for API key")]
    QuotaExceeded,
}

/// Request validation errors.
#[derive(Error, Debug, Clone)]
pub enum RequestError {
    /// The request failed server-side validation.
    #[error("Validation error: {message}")]
    Validation {
        /// Description from the API.
        message: String,
    },

    /// The model id is not recognized.
    #[error("Invalid model: {model}")]
    InvalidModel {
        /// The offending model id.
        model: String,
    },

    /// A single parameter is out of range or malformed.
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter {
        /// Name of the parameter.
        parameter: String,
        /// What was wrong with it.
        message: String,
    },
}

/// Rate limiting errors.
#[derive(Error, Debug, Clone)]
pub enum RateLimitError {
    /// Too many requests in the current window.
    #[error("Too many requests")]
    TooManyRequests {
        /// Server-suggested wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Project quota exhausted.
    #[error("Quota exceeded")]
    QuotaExceeded {
        /// Server-suggested wait before retrying.
        retry_after: Option<Duration>,
    },
}

impl RateLimitError {
    /// Returns the server-suggested retry delay, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimitError::TooManyRequests { retry_after } => *retry_after,
            RateLimitError::QuotaExceeded { retry_after } => *retry_after,
        }
    }
}

/// Network-related errors.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    /// The connection could not be established or was dropped.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Underlying transport message.
        message: String,
    },

    /// The request exceeded its deadline.
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// The deadline that was exceeded.
        duration: Duration,
    },

    /// The server closed the connection without sending a body.
    #[error("Empty response from server")]
    EmptyResponse,
}

/// Server-side errors.
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    /// 500-class failure inside the backend.
    #[error("Internal server error: {message}")]
    Internal {
        /// Description from the API.
        message: String,
    },

    /// The service is temporarily unavailable.
    #[error("Service unavailable")]
    Unavailable {
        /// Server-suggested wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The model is overloaded.
    #[error("Model overloaded: {model}")]
    ModelOverloaded {
        /// The overloaded model id.
        model: String,
    },
}

/// Response parsing errors.
#[derive(Error, Debug, Clone)]
pub enum ResponseError {
    /// The response body could not be deserialized.
    #[error("Failed to deserialize response: {message}")]
    Deserialization {
        /// Parser message.
        message: String,
    },

    /// The response parsed but did not have the expected shape.
    #[error("Unexpected response format: {message}")]
    UnexpectedFormat {
        /// What was missing or wrong.
        message: String,
    },

    /// A streaming response ended before the terminal chunk.
    #[error("Stream interrupted: {message}")]
    StreamInterrupted {
        /// Why the stream ended early.
        message: String,
    },

    /// A streaming chunk could not be parsed.
    #[error("Malformed chunk: {message}")]
    MalformedChunk {
        /// Parser message.
        message: String,
    },
}

/// Resource-related errors.
#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    /// The named model does not exist.
    #[error("Model not found: {model}")]
    ModelNotFound {
        /// The model id that was looked up.
        model: String,
    },

    /// The session's pinned model can no longer serve requests.
    #[error("Model unavailable: {model} (session model is pinned; invoke the fallback chain explicitly)")]
    ModelUnavailable {
        /// The pinned model id.
        model: String,
    },
}
