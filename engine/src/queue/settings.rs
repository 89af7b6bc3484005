//! Queue engine settings.

use super::resilience::RetryPolicy;
use super::types::{AutoPromotionConfig, CircuitBreakerConfig, RateLimitSettings};

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Waiting-list capacity, for both the primary and fallback store.
    pub max_queue_size: usize,
    /// Joins are admitted directly while fewer than this many are admitted.
    pub auto_approve_threshold: usize,
    /// Joins into an empty waiting list are admitted directly. When set, that
    /// only happens below the scheduler's `max_concurrent_admitted` ceiling;
    /// when cleared, an empty list admits without bound.
    pub cap_idle_admission: bool,
    pub wait_minutes_per_position: f64,
    pub fallback_wait_minutes_per_position: f64,
    pub rate_limits: RateLimitSettings,
    pub retry: RetryPolicy,
    pub join_breaker: CircuitBreakerConfig,
    pub status_breaker: CircuitBreakerConfig,
    pub auto_promotion: AutoPromotionConfig,
    /// Admin bearer tokens. Empty means admin routes are open.
    pub admin_tokens: Vec<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 5_000,
            auto_approve_threshold: 3,
            cap_idle_admission: true,
            wait_minutes_per_position: 2.0,
            fallback_wait_minutes_per_position: 3.0,
            rate_limits: RateLimitSettings::default(),
            retry: RetryPolicy::default(),
            join_breaker: CircuitBreakerConfig {
                failure_threshold: 5,
                cooldown_ms: 30_000,
            },
            status_breaker: CircuitBreakerConfig {
                failure_threshold: 5,
                cooldown_ms: 15_000,
            },
            auto_promotion: AutoPromotionConfig::default(),
            admin_tokens: Vec::new(),
        }
    }
}
