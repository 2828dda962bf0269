//! Network failure classification and fallback strategy selection.
//!
//! This layer is orthogonal to the backoff retry loop: it decides
//! *strategy changes* — disabling streaming, escalating the timeout —
//! rather than whether to re-run the same call. All of its mutable
//! state lives on the service instance, which the owning client
//! constructs; nothing is process-global.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::FallbackConfig;
use crate::error::{GeminiError, NetworkError, ResponseError};

/// Strategy-level retry budget: one fallback attempt per request.
pub const MAX_RETRY_ATTEMPTS: u32 = 1;

/// Minimum interval between streaming-recovery probes.
pub const NETWORK_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Whether the failed request was streaming or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A streaming request.
    Streaming,
    /// A non-streaming request.
    NonStreaming,
}

/// Per-request context the classifier needs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Streaming or not.
    pub kind: RequestKind,
    /// Zero-based count of strategy-level retries already spent.
    pub attempt: u32,
    /// Whether the API key has already validated successfully this
    /// session.
    pub api_key_validated: bool,
}

/// Failure taxonomy for transport-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailureKind {
    /// The credential itself was rejected.
    ApiAuthFailure,
    /// Connection reset/refused or an empty response — the classic
    /// signature of a VPN or middlebox interfering with the path.
    VpnInterference,
    /// The request ran out of time.
    Timeout,
    /// A streaming-specific blockage (stream requests only).
    StreamingBlockage,
    /// Anything else.
    Unknown,
}

/// An analyzed failure.
#[derive(Debug, Clone)]
pub struct NetworkFailure {
    /// Classified kind.
    pub kind: NetworkFailureKind,
    /// The original error text.
    pub message: String,
    /// The original error's machine-readable code.
    pub error_code: String,
    /// Whether the failure was a timeout.
    pub timed_out: bool,
    /// True when the key is known-good but the network path is not:
    /// the key validated, the failure is not an auth failure, and the
    /// kind is VPN interference, timeout, or streaming blockage.
    pub vpn_suspected: bool,
}

/// The strategy to apply on the next attempt, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPlan {
    /// Whether another attempt should be made at all.
    pub should_retry: bool,
    /// Whether that attempt should stream.
    pub use_streaming: bool,
    /// The per-request timeout for that attempt.
    pub timeout: Duration,
}

#[derive(Debug)]
struct ReliabilityState {
    streaming_disabled: bool,
    last_recovery_check: Option<Instant>,
}

/// Classifies failures and selects fallback strategies.
#[derive(Debug)]
pub struct NetworkReliabilityService {
    config: FallbackConfig,
    state: Mutex<ReliabilityState>,
}

impl NetworkReliabilityService {
    /// Creates a service with the given fallback configuration.
    pub fn new(config: FallbackConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ReliabilityState {
                streaming_disabled: false,
                last_recovery_check: None,
            }),
        }
    }

    /// Classifies an error into the failure taxonomy.
    ///
    /// Matching order is significant and first-match-wins: auth
    /// signals, then timeout signals, then streaming-specific signals
    /// (streaming requests only), then connection-reset/refused/empty
    /// signals, then unknown.
    pub fn analyze(&self, error: &GeminiError, context: &RequestContext) -> NetworkFailure {
        let message = error.to_string();
        let lowered = message.to_lowercase();

        let kind = if matches!(error, GeminiError::Authentication(_))
            || lowered.contains("401")
            || lowered.contains("403")
            || lowered.contains("unauthorized")
            || lowered.contains("invalid api key")
        {
            NetworkFailureKind::ApiAuthFailure
        } else if matches!(error, GeminiError::Network(NetworkError::Timeout { .. }))
            || lowered.contains("timeouterror")
            || lowered.contains("aborterror")
            || lowered.contains("etimedout")
            || lowered.contains("timed out")
        {
            NetworkFailureKind::Timeout
        } else if context.kind == RequestKind::Streaming
            && (matches!(
                error,
                GeminiError::Response(ResponseError::StreamInterrupted { .. })
                    | GeminiError::Response(ResponseError::MalformedChunk { .. })
            ) || lowered.contains("stream"))
        {
            NetworkFailureKind::StreamingBlockage
        } else if matches!(
            error,
            GeminiError::Network(NetworkError::ConnectionFailed { .. })
                | GeminiError::Network(NetworkError::EmptyResponse)
        ) || lowered.contains("econnreset")
            || lowered.contains("connection reset")
            || lowered.contains("econnrefused")
            || lowered.contains("connection refused")
            || lowered.contains("empty response")
        {
            NetworkFailureKind::VpnInterference
        } else {
            NetworkFailureKind::Unknown
        };

        let timed_out = kind == NetworkFailureKind::Timeout;

        let vpn_suspected = context.api_key_validated
            && kind != NetworkFailureKind::ApiAuthFailure
            && matches!(
                kind,
                NetworkFailureKind::VpnInterference
                    | NetworkFailureKind::Timeout
                    | NetworkFailureKind::StreamingBlockage
            );

        NetworkFailure {
            kind,
            message,
            error_code: error.code().to_string(),
            timed_out,
            vpn_suspected,
        }
    }

    /// Decides the fallback strategy for an analyzed failure.
    ///
    /// The strategy budget is a single retry: auth failures and
    /// exhausted budgets surface immediately. A VPN-suspected failure
    /// retries once with streaming forced off and the extended timeout;
    /// a plain timeout retries once with the extended timeout and
    /// streaming unchanged.
    pub fn plan_fallback(
        &self,
        failure: &NetworkFailure,
        context: &RequestContext,
    ) -> FallbackPlan {
        let no_retry = FallbackPlan {
            should_retry: false,
            use_streaming: context.kind == RequestKind::Streaming,
            timeout: self.config.default_timeout,
        };

        if failure.kind == NetworkFailureKind::ApiAuthFailure {
            return no_retry;
        }
        if context.attempt >= self.config.max_strategy_retries {
            return no_retry;
        }

        if failure.vpn_suspected {
            tracing::warn!(
                kind = ?failure.kind,
                "VPN-suspected failure: key is valid but the network path is unreliable; \
                 disabling streaming and extending the timeout"
            );
            self.disable_streaming();
            return FallbackPlan {
                should_retry: true,
                use_streaming: false,
                timeout: self.config.extended_timeout,
            };
        }

        if failure.kind == NetworkFailureKind::Timeout {
            return FallbackPlan {
                should_retry: true,
                use_streaming: context.kind == RequestKind::Streaming,
                timeout: self.config.extended_timeout,
            };
        }

        no_retry
    }

    /// Marks streaming as degraded for this client.
    pub fn disable_streaming(&self) {
        let mut state = self.state.lock();
        if !state.streaming_disabled {
            tracing::info!("streaming disabled after suspected network interference");
            state.streaming_disabled = true;
            state.last_recovery_check = Some(Instant::now());
        }
    }

    /// Whether streaming is currently degraded.
    pub fn streaming_disabled(&self) -> bool {
        self.state.lock().streaming_disabled
    }

    /// Periodic recovery check, throttled to the configured interval.
    ///
    /// Re-enables streaming once the interval has elapsed since the
    /// degradation (or the last probe), letting a degraded session
    /// self-heal instead of staying degraded forever. Returns true when
    /// streaming was re-enabled by this call.
    pub fn maybe_recover(&self) -> bool {
        let mut state = self.state.lock();
        if !state.streaming_disabled {
            return false;
        }

        let due = match state.last_recovery_check {
            Some(last) => last.elapsed() >= self.config.recovery_interval,
            None => true,
        };
        if !due {
            return false;
        }

        tracing::info!("recovery interval elapsed; re-enabling streaming");
        state.streaming_disabled = false;
        state.last_recovery_check = Some(Instant::now());
        true
    }

    /// The default per-request timeout.
    pub fn default_timeout(&self) -> Duration {
        self.config.default_timeout
    }
}
