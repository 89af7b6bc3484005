//! Service-wide atomic counters.
//!
//! Updated on the hot path without locking; read as a consistent-enough
//! snapshot by the admin stats endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

pub struct QueueMetrics {
    pub joins: AtomicU64,
    pub auto_approved: AtomicU64,
    pub enqueued: AtomicU64,
    pub rate_limited: AtomicU64,
    pub fallback_joins: AtomicU64,
    pub degraded_responses: AtomicU64,
    pub admin_promoted: AtomicU64,
    pub leaves: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueCounters {
    pub joins: u64,
    pub auto_approved: u64,
    pub enqueued: u64,
    pub rate_limited: u64,
    pub fallback_joins: u64,
    pub degraded_responses: u64,
    pub admin_promoted: u64,
    pub leaves: u64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self {
            joins: AtomicU64::new(0),
            auto_approved: AtomicU64::new(0),
            enqueued: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            fallback_joins: AtomicU64::new(0),
            degraded_responses: AtomicU64::new(0),
            admin_promoted: AtomicU64::new(0),
            leaves: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_auto_approved(&self) {
        self.auto_approved.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_fallback_join(&self) {
        self.fallback_joins.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_degraded(&self) {
        self.degraded_responses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_admin_promoted(&self, count: u64) {
        self.admin_promoted.fetch_add(count, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_leave(&self) {
        self.leaves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueueCounters {
        QueueCounters {
            joins: self.joins.load(Ordering::Relaxed),
            auto_approved: self.auto_approved.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            fallback_joins: self.fallback_joins.load(Ordering::Relaxed),
            degraded_responses: self.degraded_responses.load(Ordering::Relaxed),
            admin_promoted: self.admin_promoted.load(Ordering::Relaxed),
            leaves: self.leaves.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter. Used by the admin reset.
    pub fn reset(&self) {
        for counter in [
            &self.joins,
            &self.auto_approved,
            &self.enqueued,
            &self.rate_limited,
            &self.fallback_joins,
            &self.degraded_responses,
            &self.admin_promoted,
            &self.leaves,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}
