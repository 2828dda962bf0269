//! Configuration types for the assistant core.

use std::collections::HashSet;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{ConfigurationError, GeminiError};

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default API version.
pub const DEFAULT_API_VERSION: &str = "v1beta";

/// Default per-request timeout (10 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Extended per-request timeout used when a fallback retry escalates (30 seconds).
pub const EXTENDED_TIMEOUT_SECS: u64 = 30;

/// Default model served when the caller does not arbitrate explicitly.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Authentication method for the API key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AuthMethod {
    /// Use the x-goog-api-key header (recommended).
    #[default]
    Header,
    /// Use the ?key= query parameter.
    QueryParam,
}

/// Retry configuration.
///
/// Immutable for the lifetime of the client that owns it.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first call.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling on any single backoff delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Error codes considered retryable when an error carries no
    /// inherent retryability (matched against the error message).
    pub retryable_error_codes: HashSet<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            retryable_error_codes: [
                "RATE_LIMIT_EXCEEDED",
                "INTERNAL",
                "UNAVAILABLE",
                "TIMEOUT",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl RetryConfig {
    /// Creates a configuration that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Consecutive half-open successes before the circuit closes.
    pub success_threshold: u32,
    /// How long the circuit stays open before admitting a probe call.
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Response cache configuration.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Time-to-live per entry, measured from insertion.
    pub ttl: Duration,
    /// Maximum number of entries before LRU eviction.
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_size: 100,
        }
    }
}

/// Fallback-strategy configuration for the network reliability layer.
#[derive(Clone, Debug)]
pub struct FallbackConfig {
    /// Baseline per-request timeout.
    pub default_timeout: Duration,
    /// Escalated timeout used on a fallback retry.
    pub extended_timeout: Duration,
    /// Strategy-level retry budget (distinct from the backoff retry loop).
    pub max_strategy_retries: u32,
    /// Minimum interval between streaming-recovery probes.
    pub recovery_interval: Duration,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            extended_timeout: Duration::from_secs(EXTENDED_TIMEOUT_SECS),
            max_strategy_retries: 1,
            recovery_interval: Duration::from_secs(60),
        }
    }
}

/// Configuration for the assistant client.
#[derive(Clone)]
pub struct AssistConfig {
    /// API key (required).
    pub api_key: SecretString,
    /// Base URL for the API.
    pub base_url: Url,
    /// API version.
    pub api_version: String,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Model served when no arbitration/selection has happened.
    pub default_model: String,
    /// Authentication method.
    pub auth_method: AuthMethod,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Response cache configuration.
    pub cache: CacheConfig,
    /// Network fallback configuration.
    pub fallback: FallbackConfig,
}

impl AssistConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AssistConfigBuilder {
        AssistConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `GEMINI_API_KEY` or `GOOGLE_API_KEY` (required)
    /// - `GEMINI_BASE_URL` (optional)
    /// - `GEMINI_API_VERSION` (optional)
    /// - `GEMINI_TIMEOUT_SECS` (optional)
    pub fn from_env() -> Result<Self, GeminiError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| ConfigurationError::MissingApiKey)?;

        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let api_version =
            std::env::var("GEMINI_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        let timeout_secs: u64 = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let fallback = FallbackConfig {
            default_timeout: Duration::from_secs(timeout_secs),
            ..Default::default()
        };

        Self::builder()
            .api_key(SecretString::new(api_key.into()))
            .base_url(&base_url)?
            .api_version(&api_version)
            .fallback(fallback)
            .build()
    }
}

impl std::fmt::Debug for AssistConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("default_model", &self.default_model)
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

/// Builder for `AssistConfig`.
#[derive(Default)]
pub struct AssistConfigBuilder {
    api_key: Option<SecretString>,
    base_url: Option<Url>,
    api_version: Option<String>,
    connect_timeout: Option<Duration>,
    default_model: Option<String>,
    auth_method: Option<AuthMethod>,
    retry: Option<RetryConfig>,
    circuit_breaker: Option<CircuitBreakerConfig>,
    cache: Option<CacheConfig>,
    fallback: Option<FallbackConfig>,
}

impl AssistConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, base_url: &str) -> Result<Self, GeminiError> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Set the API version.
    pub fn api_version(mut self, version: &str) -> Self {
        self.api_version = Some(version.to_string());
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the default model.
    pub fn default_model(mut self, model: &str) -> Self {
        self.default_model = Some(model.to_string());
        self
    }

    /// Set the authentication method.
    pub fn auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    /// Set the retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Set the circuit breaker configuration.
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = Some(config);
        self
    }

    /// Set the response cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    /// Set the network fallback configuration.
    pub fn fallback(mut self, config: FallbackConfig) -> Self {
        self.fallback = Some(config);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<AssistConfig, GeminiError> {
        let api_key = self.api_key.ok_or(ConfigurationError::MissingApiKey)?;

        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        Ok(AssistConfig {
            api_key,
            base_url,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            connect_timeout: self
                .connect_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            default_model: self
                .default_model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            auth_method: self.auth_method.unwrap_or_default(),
            retry: self.retry.unwrap_or_default(),
            circuit_breaker: self.circuit_breaker.unwrap_or_default(),
            cache: self.cache.unwrap_or_default(),
            fallback: self.fallback.unwrap_or_default(),
        })
    }
}
