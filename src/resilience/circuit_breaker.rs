//! Circuit breaker for the assistant core.
//!
//! Isolates a failing backend: after enough consecutive failures the
//! circuit opens and calls fail fast until a probe is admitted. Each
//! client owns its own breaker; independent backends never share
//! failure state.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::CircuitBreakerConfig;
use crate::error::{GeminiError, GeminiResult};

/// The state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are rejected until the open timeout expires.
    Open,
    /// A limited probe is in flight to test recovery.
    HalfOpen,
}

/// Snapshot of breaker state for the diagnostics surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitStats {
    /// Current state.
    pub state: CircuitState,
    /// Consecutive failures observed in the closed state.
    pub failure_count: u32,
    /// Consecutive successes observed in the half-open state.
    pub success_count: u32,
    /// Time remaining until the next probe is admitted, when open.
    pub open_remaining: Option<Duration>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    next_attempt_at: Option<Instant>,
}

/// Circuit breaker that prevents hammering a failing backend.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Creates a new circuit breaker with the given configuration.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                next_attempt_at: None,
            }),
        }
    }

    /// Creates a circuit breaker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }

    /// Checks whether a call may proceed.
    ///
    /// An open circuit whose timeout has elapsed transitions to
    /// half-open here — the transition is lazy, driven by the next call
    /// rather than by a timer.
    pub fn check(&self) -> GeminiResult<()> {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let next_attempt_at = inner
                    .next_attempt_at
                    .unwrap_or_else(Instant::now);
                let now = Instant::now();
                if now >= next_attempt_at {
                    tracing::info!("circuit breaker transitioning to half-open");
                    inner.state = CircuitState::HalfOpen;
                    inner.success_count = 0;
                    Ok(())
                } else {
                    Err(GeminiError::CircuitOpen {
                        retry_in: next_attempt_at.saturating_duration_since(now),
                    })
                }
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                tracing::debug!(
                    successes = inner.success_count,
                    threshold = self.config.success_threshold,
                    "circuit breaker half-open success"
                );
                if inner.success_count >= self.config.success_threshold {
                    tracing::info!("circuit breaker closing");
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.next_attempt_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                tracing::warn!(
                    failures = inner.failure_count,
                    threshold = self.config.failure_threshold,
                    "circuit breaker failure"
                );
                if inner.failure_count >= self.config.failure_threshold {
                    self.open(&mut inner);
                }
            }
            // Half-open is intolerant: one failure re-opens.
            CircuitState::HalfOpen => self.open(&mut inner),
            CircuitState::Open => {}
        }
    }

    fn open(&self, inner: &mut BreakerInner) {
        tracing::warn!(timeout = ?self.config.timeout, "circuit breaker opening");
        inner.state = CircuitState::Open;
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.next_attempt_at = Some(Instant::now() + self.config.timeout);
    }

    /// Returns the current state.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Returns a snapshot for the diagnostics surface.
    pub fn stats(&self) -> CircuitStats {
        let inner = self.inner.lock();
        let open_remaining = match inner.state {
            CircuitState::Open => inner
                .next_attempt_at
                .map(|at| at.saturating_duration_since(Instant::now())),
            _ => None,
        };
        CircuitStats {
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            open_remaining,
        }
    }

    /// Resets the breaker to the closed state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.next_attempt_at = None;
    }
}
