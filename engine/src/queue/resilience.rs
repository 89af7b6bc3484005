//! Retry with exponential backoff behind a circuit breaker.
//!
//! One [`ResilienceWrapper`] guards one operation category. Only
//! [`QueueError::BackendUnavailable`] is retried and counted against the
//! breaker; typed business outcomes pass through untouched.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::types::{now_ms, Admission, CircuitBreakerConfig, CircuitBreakerEntry, CircuitState};
use crate::error::QueueError;

// ============== Retry Policy ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry following failed attempt `attempt` (0-based),
    /// without jitter.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        Duration::from_millis(self.backoff_ms(attempt) + jitter)
    }
}

// ============== Snapshot ==============

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircuitSnapshot {
    pub operation: String,
    pub state: CircuitState,
    pub failures: u32,
    pub last_failure_at: Option<u64>,
    pub opened_at: Option<u64>,
}

// ============== Trial permit ==============

/// Returns a half-open trial to the breaker if the guarded call is dropped
/// before reporting an outcome.
struct TrialPermit<'a> {
    breaker: &'a Mutex<CircuitBreakerEntry>,
    armed: bool,
}

impl TrialPermit<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TrialPermit<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.lock().release_trial();
        }
    }
}

// ============== Wrapper ==============

pub struct ResilienceWrapper {
    operation: &'static str,
    breaker: Mutex<CircuitBreakerEntry>,
    breaker_config: CircuitBreakerConfig,
    retry: RetryPolicy,
    // Wall clock anchored to the tokio clock so paused-time tests drive cooldowns.
    wall_origin_ms: u64,
    origin: Instant,
}

impl ResilienceWrapper {
    pub fn new(operation: &'static str, breaker_config: CircuitBreakerConfig, retry: RetryPolicy) -> Self {
        Self {
            operation,
            breaker: Mutex::new(CircuitBreakerEntry::default()),
            breaker_config,
            retry,
            wall_origin_ms: now_ms(),
            origin: Instant::now(),
        }
    }

    #[inline]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    #[inline]
    fn now(&self) -> u64 {
        self.wall_origin_ms + self.origin.elapsed().as_millis() as u64
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.lock().state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let cb = self.breaker.lock();
        CircuitSnapshot {
            operation: self.operation.to_string(),
            state: cb.state,
            failures: cb.failures,
            last_failure_at: (cb.last_failure_at > 0).then_some(cb.last_failure_at),
            opened_at: (cb.state != CircuitState::Closed).then_some(cb.opened_at),
        }
    }

    /// Force the breaker back to closed. Used by the admin reset.
    pub fn reset(&self) {
        *self.breaker.lock() = CircuitBreakerEntry::default();
    }

    /// Run `op` under the breaker, retrying transient failures.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, QueueError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, QueueError>>,
    {
        let admission = self
            .breaker
            .lock()
            .try_acquire(self.now(), self.breaker_config.cooldown_ms);

        let mut permit = TrialPermit {
            breaker: &self.breaker,
            armed: false,
        };
        match admission {
            Admission::Rejected => {
                debug!(operation = self.operation, "Circuit open, rejecting call");
                return Err(QueueError::CircuitOpen {
                    operation: self.operation,
                });
            }
            Admission::Trial => {
                debug!(operation = self.operation, "Circuit half-open, running trial call");
                permit.armed = true;
            }
            Admission::Allowed => {}
        }

        let result = self.run_with_retry(&mut op).await;
        permit.disarm();

        let now = self.now();
        let mut cb = self.breaker.lock();
        // Calls admitted before the circuit opened must not move it.
        let counts = admission == Admission::Trial || cb.state == CircuitState::Closed;
        match result {
            Err(err) if err.is_retryable() => {
                if counts {
                    let was_open = cb.state == CircuitState::Open;
                    cb.record_failure(now, self.breaker_config.failure_threshold);
                    if cb.state == CircuitState::Open && !was_open {
                        warn!(
                            operation = self.operation,
                            failures = cb.failures,
                            cooldown_ms = self.breaker_config.cooldown_ms,
                            "Circuit opened after consecutive failures"
                        );
                    }
                } else {
                    cb.last_failure_at = now;
                }
                Err(QueueError::UnknownFailure(format!(
                    "{} failed after {} attempts: {}",
                    self.operation, self.retry.max_attempts, err
                )))
            }
            other => {
                if !counts {
                    debug!(operation = self.operation, state = ?cb.state, "Ignoring late success");
                } else {
                    if cb.state != CircuitState::Closed {
                        debug!(operation = self.operation, "Circuit closed after successful trial");
                    }
                    cb.record_success();
                }
                other
            }
        }
    }

    async fn run_with_retry<T, F, Fut>(&self, op: &mut F) -> Result<T, QueueError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, QueueError>>,
    {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        operation = self.operation,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
