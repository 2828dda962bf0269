//! # Assistant Reliability Core
//!
//! The reliability and context-selection core of a Gemini-backed
//! coding assistant: it turns a raw chat turn into a bounded, retried,
//! circuit-protected, context-budgeted request to the backend, and
//! diagnoses why a request failed in order to pick a safe fallback
//! strategy.
//!
//! ## Features
//!
//! - Exponential-backoff retry with jitter, gated on error class
//! - Circuit breaker isolating a failing backend (closed/open/half-open)
//! - TTL + LRU response cache for idempotent non-streaming requests
//! - Network failure classification (auth vs. transient vs. VPN
//!   interference vs. streaming blockage) and fallback selection
//! - Hybrid-ranked, token-budgeted context selection over conversation
//!   history
//! - Local/cloud model arbitration with a session-freeze contract
//! - Streaming with chunked JSON parsing and automatic degrade to
//!   non-streaming when the path is unreliable
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assist_gemini::{AssistClient, ChatRequest};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AssistClient::builder()
//!         .api_key(SecretString::new("your-api-key".into()))
//!         .build()?;
//!
//!     let request = ChatRequest::user_message("gemini-1.5-flash", "Hello!");
//!     let response = client.send_request(&request).await?;
//!     println!("{}", response.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `client` - the orchestrating client and its builder
//! - `config` - configuration types and builder
//! - `auth` - API key management
//! - `resilience` - retry executor and circuit breaker
//! - `cache` - bounded response cache
//! - `reliability` - failure classification and fallback strategy
//! - `context` - context selection and token budgeting
//! - `arbitration` - local/cloud model arbitration
//! - `transport` - HTTP transport layer
//! - `streaming` - chunked JSON stream parsing
//! - `error` - error taxonomy
//! - `types` - chat and wire types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arbitration;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod reliability;
pub mod resilience;
pub mod streaming;
pub mod transport;
pub mod types;

// Always available so integration tests and downstream test suites can
// script the transport.
pub mod mocks;

pub use auth::{ApiKeyAuthManager, AuthManager};
pub use client::{AssistClient, AssistClientBuilder, ClientStats};
pub use config::{
    AssistConfig, AssistConfigBuilder, AuthMethod, CacheConfig, CircuitBreakerConfig,
    FallbackConfig, RetryConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS, EXTENDED_TIMEOUT_SECS,
};
pub use error::{
    AuthenticationError, ConfigurationError, GeminiError, GeminiResult, NetworkError,
    RateLimitError, RequestError, ResourceError, ResponseError, ServerError,
};

pub use arbitration::{
    ArbitrationContext, ArbitrationResult, ExecutionMode, KeywordPrivacyClassifier,
    KeywordTaskClassifier, ModelArbitrator, ModelSwitchObserver, PrivacyClassifier, PrivacyLevel,
    TaskClassifier, TaskType, TokenPressure,
};
pub use cache::{request_cache_key, CacheStats, ResponseCache};
pub use context::{
    ContextChunk, ContextManager, ContextSlice, ImportanceEstimator, TokenBudget,
    MIN_CONTEXT_MESSAGES,
};
pub use reliability::{
    FallbackPlan, NetworkFailure, NetworkFailureKind, NetworkReliabilityService, RequestContext,
    RequestKind, MAX_RETRY_ATTEMPTS, NETWORK_CHECK_INTERVAL,
};
pub use resilience::{
    CircuitBreaker, CircuitState, CircuitStats, ResilienceOrchestrator, RetryExecutor,
    RetryObserver,
};
pub use streaming::{ChunkParser, StreamAccumulator};
pub use transport::{
    ChunkedStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport,
    RequestBuilder, ResponseParser, TransportError,
};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, ChatTurn, Content, FinishReason,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, ModelFamily, Part, Role,
    StreamEvent, TurnRole, UsageMetadata,
};
