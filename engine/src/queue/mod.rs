//! Queue module - waiting-room admission engine.
//!
//! ## Module Organization
//!
//! - `manager.rs` - Core QueueManager struct, constructors, shared helpers
//! - `settings.rs` - QueueConfig
//! - `types/` - QueueStore, RateLimiter, circuit state, configuration, tickets
//! - `background/` - Auto-promotion scheduler and maintenance loop
//!
//! ### Resilience
//!
//! - `resilience.rs` - Retry with backoff behind a circuit breaker
//! - `fallback.rs` - Secondary waiting list for degraded operation
//! - `backend.rs` - Backing-store hook and its mock implementation
//! - `captcha.rs` - Fail-open CAPTCHA verification
//!
//! ### Operations
//!
//! - `join.rs` - Join (rate limit, CAPTCHA, auto-approval, fallback)
//! - `status.rs` - Status polling
//! - `leave.rs` - Leave
//! - `admin.rs` - Manual promotion, stats, scheduler and fallback control, reset
//! - `monitoring.rs` - Public monitoring snapshot

mod background;
mod manager;
mod settings;
pub mod types;

pub mod backend;
pub mod captcha;
pub mod fallback;
pub mod resilience;

pub mod admin;
mod join;
mod leave;
pub mod monitoring;
mod status;

#[cfg(test)]
mod tests;

pub use background::{AutoPromotionScheduler, SchedulerMetrics, SchedulerStatus, TickOutcome};
pub use manager::QueueManager;
pub use settings::QueueConfig;
