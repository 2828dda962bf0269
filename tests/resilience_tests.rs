//! Integration tests for the resilience patterns (retry, circuit breaker).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use assist_gemini::error::{AuthenticationError, GeminiError, RateLimitError};
use assist_gemini::resilience::{
    CircuitBreaker, CircuitState, ResilienceOrchestrator, RetryExecutor,
};
use assist_gemini::{CircuitBreakerConfig, RetryConfig};

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(20),
        ..Default::default()
    }
}

fn rate_limited() -> GeminiError {
    GeminiError::RateLimit(RateLimitError::TooManyRequests { retry_after: None })
}

#[tokio::test]
async fn test_scenario_a_budget_exhausted_before_success() {
    // Arrange: three consecutive rate-limit failures, then a success
    // that is never reached because max_attempts is 3.
    let executor = RetryExecutor::new(fast_retry(3));
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = attempts.clone();

    // Act
    let result = executor
        .execute(
            || async {
                let count = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if count < 3 {
                    Err(rate_limited())
                } else {
                    Ok("unreachable")
                }
            },
            &CancellationToken::new(),
        )
        .await;

    // Assert
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().code(), "RATE_LIMIT_EXCEEDED");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_scenario_b_success_after_two_retries() {
    // Arrange: two rate-limit failures then success; the observer must
    // see attempts 1 and 2 exactly.
    let observed: Arc<parking_lot::Mutex<Vec<u32>>> = Arc::default();
    let observed_clone = observed.clone();
    let executor = RetryExecutor::new(fast_retry(3)).with_observer(Arc::new(
        move |attempt: u32, _error: &GeminiError| {
            observed_clone.lock().push(attempt);
        },
    ));

    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = attempts.clone();

    // Act
    let result = executor
        .execute(
            || async {
                let count = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(rate_limited())
                } else {
                    Ok("served")
                }
            },
            &CancellationToken::new(),
        )
        .await;

    // Assert
    assert_eq!(result.unwrap(), "served");
    assert_eq!(*observed.lock(), vec![1, 2]);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_non_retryable_error_invokes_operation_once() {
    let executor = RetryExecutor::new(fast_retry(5));
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = attempts.clone();

    let result: Result<(), _> = executor
        .execute(
            || async {
                attempts_clone.fetch_add(1, Ordering::SeqCst);
                Err(GeminiError::Authentication(
                    AuthenticationError::InvalidApiKey,
                ))
            },
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_breaker_opens_at_threshold_and_fails_fast() {
    let breaker = CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 3,
        success_threshold: 2,
        timeout: Duration::from_secs(60),
    });

    for _ in 0..3 {
        breaker.record_failure();
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    // Before next_attempt_time, calls are rejected without reaching
    // the wrapped operation (the orchestrator never invokes it).
    let rejection = breaker.check().unwrap_err();
    assert_eq!(rejection.code(), "CIRCUIT_OPEN");
}

#[test]
fn test_breaker_half_open_single_failure_reopens() {
    let breaker = CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 1,
        success_threshold: 3,
        timeout: Duration::from_millis(20),
    });

    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    std::thread::sleep(Duration::from_millis(30));
    breaker.check().unwrap();
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn test_orchestrator_open_circuit_skips_operation() {
    let orchestrator = ResilienceOrchestrator::new(
        fast_retry(1),
        CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 1,
            timeout: Duration::from_secs(60),
        },
    );
    let attempts = Arc::new(AtomicU32::new(0));

    let attempts_clone = attempts.clone();
    let _ = orchestrator
        .execute(
            move || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(rate_limited())
                }
            },
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(orchestrator.circuit_breaker().state(), CircuitState::Open);

    let attempts_clone = attempts.clone();
    let result = orchestrator
        .execute(
            move || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, GeminiError>(())
                }
            },
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(GeminiError::CircuitOpen { .. })));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_attempt_does_not_count_as_breaker_failure() {
    let orchestrator = ResilienceOrchestrator::new(
        fast_retry(3),
        CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 1,
            timeout: Duration::from_secs(60),
        },
    );

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result: Result<(), _> = orchestrator.execute(|| async { Ok(()) }, &cancel).await;

    assert!(matches!(result, Err(GeminiError::Cancelled)));
    assert_eq!(orchestrator.circuit_breaker().state(), CircuitState::Closed);
    assert_eq!(orchestrator.circuit_breaker().stats().failure_count, 0);
}
