//! Retry logic with exponential backoff for the assistant core.
//!
//! Retries are gated on error retryability: an error retries when it
//! carries inherent retryability or when its message matches one of the
//! configured retryable codes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::error::{GeminiError, GeminiResult};

/// Observer invoked before each retry sleep, for diagnostics.
pub trait RetryObserver: Send + Sync {
    /// Called with the 1-based attempt number that just failed and the
    /// error it failed with.
    fn on_retry(&self, attempt: u32, error: &GeminiError);
}

impl<F> RetryObserver for F
where
    F: Fn(u32, &GeminiError) + Send + Sync,
{
    fn on_retry(&self, attempt: u32, error: &GeminiError) {
        self(attempt, error)
    }
}

/// Executes operations with retry logic and exponential backoff.
pub struct RetryExecutor {
    config: RetryConfig,
    observer: Option<Arc<dyn RetryObserver>>,
    last_attempts: AtomicU32,
}

impl RetryExecutor {
    /// Creates a new retry executor with the given configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            observer: None,
            last_attempts: AtomicU32::new(0),
        }
    }

    /// Attaches a retry observer.
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Executes an operation, retrying retryable failures with
    /// exponentially backed-off, jittered delays.
    ///
    /// The attempt counter starts fresh on every call. Cancellation is
    /// observed before each attempt and during backoff sleeps; a
    /// cancelled call returns `GeminiError::Cancelled`.
    pub async fn execute<F, Fut, T>(
        &self,
        operation: F,
        cancel: &CancellationToken,
    ) -> GeminiResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = GeminiResult<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                self.last_attempts.store(attempt, Ordering::SeqCst);
                return Err(GeminiError::Cancelled);
            }

            attempt += 1;

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::info!(attempts = attempt, "operation succeeded after retries");
                    }
                    self.last_attempts.store(attempt, Ordering::SeqCst);
                    return Ok(result);
                }
                Err(e) if self.is_retryable(&e) && attempt < self.config.max_attempts => {
                    // Server-suggested delays take precedence over backoff.
                    let delay = e.retry_after().unwrap_or_else(|| self.backoff_delay(attempt));

                    tracing::warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        code = e.code(),
                        delay_ms = delay.as_millis() as u64,
                        "retryable error, backing off"
                    );

                    if let Some(observer) = &self.observer {
                        observer.on_retry(attempt, &e);
                    }

                    tokio::select! {
                        () = cancel.cancelled() => {
                            self.last_attempts.store(attempt, Ordering::SeqCst);
                            return Err(GeminiError::Cancelled);
                        }
                        () = sleep(delay) => {}
                    }
                }
                Err(e) => {
                    if attempt > 1 {
                        tracing::error!(attempts = attempt, code = e.code(), "retries exhausted");
                    }
                    self.last_attempts.store(attempt, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }
    }

    /// Whether the retry gate passes for this error.
    fn is_retryable(&self, error: &GeminiError) -> bool {
        if error.is_retryable() {
            return true;
        }
        let message = error.to_string();
        self.config
            .retryable_error_codes
            .iter()
            .any(|code| error.code() == code || message.contains(code.as_str()))
    }

    /// Backoff delay for the given 1-based failed-attempt number:
    /// `min(base * multiplier^(attempt-1) + jitter, max_delay)` where
    /// jitter is uniform in `[0, 0.3 * exponential_delay)`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self.config.base_delay.as_secs_f64()
            * self.config.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let jitter = rand::random::<f64>() * 0.3 * exponential;
        let capped = (exponential + jitter).min(self.config.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Number of attempts used by the most recent `execute` call.
    pub fn last_attempts(&self) -> u32 {
        self.last_attempts.load(Ordering::SeqCst)
    }

    /// Returns the retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
