//! Circuit breaker state machine.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_ms: 30_000,
        }
    }
}

/// Outcome of asking the breaker for permission to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Normal call in the closed state.
    Allowed,
    /// The single half-open trial call.
    Trial,
    /// Rejected without running the operation.
    Rejected,
}

#[derive(Debug)]
pub struct CircuitBreakerEntry {
    pub state: CircuitState,
    pub failures: u32,
    pub last_failure_at: u64,
    pub opened_at: u64,
    trial_in_flight: bool,
}

impl Default for CircuitBreakerEntry {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            last_failure_at: 0,
            opened_at: 0,
            trial_in_flight: false,
        }
    }
}

impl CircuitBreakerEntry {
    /// Decide whether a call may proceed at `now`.
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open and hands
    /// out exactly one trial; everything else is rejected until that trial
    /// reports back.
    pub fn try_acquire(&mut self, now: u64, cooldown_ms: u64) -> Admission {
        match self.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                if now >= self.opened_at.saturating_add(cooldown_ms) {
                    self.state = CircuitState::HalfOpen;
                    self.trial_in_flight = true;
                    Admission::Trial
                } else {
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen => {
                if self.trial_in_flight {
                    Admission::Rejected
                } else {
                    self.trial_in_flight = true;
                    Admission::Trial
                }
            }
        }
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
        self.trial_in_flight = false;
        self.state = CircuitState::Closed;
    }

    pub fn record_failure(&mut self, now: u64, failure_threshold: u32) {
        self.failures = self.failures.saturating_add(1);
        self.last_failure_at = now;

        match self.state {
            CircuitState::Closed => {
                if self.failures >= failure_threshold {
                    self.state = CircuitState::Open;
                    self.opened_at = now;
                }
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.opened_at = now;
                self.trial_in_flight = false;
            }
            CircuitState::Open => {
                self.opened_at = now;
            }
        }
    }

    /// Give back a trial permit whose call ended without a verdict.
    pub fn release_trial(&mut self) {
        self.trial_in_flight = false;
    }
}
