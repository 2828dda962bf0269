//! Resilience layer for the assistant core.
//!
//! Coordinates the circuit breaker and the retry executor around a
//! single logical operation: the breaker is consulted once per call,
//! the retry loop drives sequential attempts inside it, and the outcome
//! is recorded back into the breaker.

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState, CircuitStats};
pub use retry::{RetryExecutor, RetryObserver};

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{CircuitBreakerConfig, RetryConfig};
use crate::error::{GeminiError, GeminiResult};

/// Orchestrates resilience patterns for backend requests.
///
/// Each client owns one orchestrator; the breaker and the retry
/// executor in it coordinate sequential attempts of one logical
/// operation, never a pool of workers.
pub struct ResilienceOrchestrator {
    retry: RetryExecutor,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl ResilienceOrchestrator {
    /// Creates a new orchestrator from the two configurations.
    pub fn new(retry: RetryConfig, circuit_breaker: CircuitBreakerConfig) -> Self {
        Self {
            retry: RetryExecutor::new(retry),
            circuit_breaker: Arc::new(CircuitBreaker::new(circuit_breaker)),
        }
    }

    /// Attaches a retry observer.
    pub fn with_retry_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.retry = self.retry.with_observer(observer);
        self
    }

    /// Executes an operation behind the breaker, with retries inside.
    ///
    /// A rejected call (circuit open) never invokes the operation. A
    /// cancelled call is recorded as neither success nor failure, so a
    /// user-initiated stop cannot corrupt the breaker's counters.
    /// Non-retryable errors propagate without affecting the breaker;
    /// the breaker tracks backend health, not caller mistakes.
    pub async fn execute<F, Fut, T>(
        &self,
        operation: F,
        cancel: &CancellationToken,
    ) -> GeminiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = GeminiResult<T>>,
    {
        self.circuit_breaker.check()?;

        let result = self.retry.execute(&operation, cancel).await;

        match &result {
            Ok(_) => self.circuit_breaker.record_success(),
            Err(GeminiError::Cancelled) => {}
            Err(e) if e.is_retryable() => self.circuit_breaker.record_failure(),
            Err(_) => {}
        }

        result
    }

    /// Returns the circuit breaker.
    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// Number of attempts used by the most recent call.
    pub fn last_retry_attempts(&self) -> u32 {
        self.retry.last_attempts()
    }

    /// Resets the breaker to its initial state.
    pub fn reset(&self) {
        self.circuit_breaker.reset();
        tracing::info!("resilience orchestrator reset");
    }
}

impl std::fmt::Debug for ResilienceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceOrchestrator")
            .field("circuit_breaker", &self.circuit_breaker)
            .finish()
    }
}
