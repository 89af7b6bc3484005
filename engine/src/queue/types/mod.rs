//! Type definitions for the waiting room.
//!
//! Module organization:
//! - `store.rs` - Primary FIFO waiting list and admitted set
//! - `limiters.rs` - Fixed-window rate limiter and scopes
//! - `circuit.rs` - Circuit breaker state machine
//! - `config.rs` - Auto-promotion and business-hours configuration
//! - `identity.rs` - Client fingerprinting
//! - `metrics.rs` - Service-wide atomic counters
//! - `ticket.rs` - Join/status/leave/process results, wait estimate
//! - `time.rs` - Timestamps, hash type aliases

mod circuit;
mod config;
mod identity;
mod limiters;
mod metrics;
mod store;
mod ticket;
mod time;

// Re-export all public types
pub use circuit::{Admission, CircuitBreakerConfig, CircuitBreakerEntry, CircuitState};
pub use config::{AutoPromotionConfig, AutoPromotionConfigPatch, BusinessHours, BusinessHoursPatch};
pub use identity::{client_origin, derive_client_id};
pub use limiters::{RateLimitDecision, RateLimitPolicy, RateLimitSettings, RateLimiter, RateScope};
pub use metrics::{QueueCounters, QueueMetrics};
pub use store::{EnqueueOutcome, PromotionResult, QueueStats, QueueStore, RemoveOutcome, WaitingEntry};
pub use ticket::{estimate_wait_minutes, LeaveResult, ProcessResult, QueueTicket, TicketStatus};
pub use time::{now_ms, FxHashSet};
