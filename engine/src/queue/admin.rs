//! Admin operations: manual promotion, stats, scheduler config, fallback
//! control, and reset.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::background::SchedulerStatus;
use super::manager::QueueManager;
use super::resilience::CircuitSnapshot;
use super::types::{
    AutoPromotionConfig, AutoPromotionConfigPatch, EnqueueOutcome, ProcessResult, QueueCounters,
};
use crate::error::QueueError;

pub const MAX_PROCESS_COUNT: i64 = 1_000;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_in_queue: usize,
    pub allowed_users: usize,
    pub oldest_in_queue: Option<u64>,
    pub scheduler: SchedulerStatus,
    pub circuits: Vec<CircuitSnapshot>,
    pub fallback_mode: bool,
    pub fallback_queue_size: usize,
    pub rate_limit_windows: usize,
    pub counters: QueueCounters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FallbackToggle {
    pub fallback_mode: bool,
    /// Entries moved back into the primary queue.
    pub requeued: usize,
    /// Entries lost because the primary queue was full.
    pub dropped: usize,
}

impl QueueManager {
    /// Promote `count` clients immediately, ignoring business hours and the
    /// concurrency ceiling.
    pub fn process_queue(&self, count: i64) -> Result<ProcessResult, QueueError> {
        if !(1..=MAX_PROCESS_COUNT).contains(&count) {
            return Err(QueueError::InvalidInput(format!(
                "count must be between 1 and {MAX_PROCESS_COUNT}"
            )));
        }

        let result = self.store.write().promote_batch(count as usize);
        self.metrics
            .record_admin_promoted(result.promoted.len() as u64);
        info!(
            requested = count,
            promoted = result.promoted.len(),
            remaining = result.remaining,
            "Admin processed queue"
        );

        Ok(ProcessResult {
            processed_count: result.promoted.len(),
            remaining_in_queue: result.remaining,
            processed_users: result.promoted,
        })
    }

    pub fn admin_stats(&self) -> AdminStats {
        let stats = self.store.read().stats();
        AdminStats {
            total_in_queue: stats.total_waiting,
            allowed_users: stats.total_admitted,
            oldest_in_queue: stats.oldest_joined_at,
            scheduler: self.scheduler.status(Utc::now()),
            circuits: vec![self.join_guard.snapshot(), self.status_guard.snapshot()],
            fallback_mode: self.fallback.is_in_fallback_mode(),
            fallback_queue_size: self.fallback.size(),
            rate_limit_windows: self.rate_limiter.tracked_windows(),
            counters: self.metrics.snapshot(),
        }
    }

    pub fn scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status(Utc::now())
    }

    pub fn update_scheduler(
        &self,
        patch: &AutoPromotionConfigPatch,
    ) -> Result<AutoPromotionConfig, QueueError> {
        self.scheduler.update_config(patch)
    }

    /// Enter or leave fallback mode.
    ///
    /// Leaving moves every fallback entry back into the primary queue in the
    /// order it joined, keeping its original join time.
    pub fn set_fallback_mode(&self, enabled: bool) -> FallbackToggle {
        if enabled {
            self.fallback.enable_fallback();
            return FallbackToggle {
                fallback_mode: true,
                requeued: 0,
                dropped: 0,
            };
        }

        self.fallback.disable_fallback();
        let entries = self.fallback.drain();
        let (mut requeued, mut dropped) = (0, 0);
        {
            let mut store = self.store.write();
            for entry in entries {
                match store.enqueue_at(&entry.client_id, entry.joined_at) {
                    EnqueueOutcome::Enqueued { .. } => requeued += 1,
                    EnqueueOutcome::Full => dropped += 1,
                    EnqueueOutcome::AlreadyWaiting { .. } | EnqueueOutcome::Admitted => {}
                }
            }
        }

        if dropped > 0 {
            warn!(requeued, dropped, "Primary queue full while draining fallback queue");
        } else {
            info!(requeued, "Fallback queue drained into primary queue");
        }
        FallbackToggle {
            fallback_mode: false,
            requeued,
            dropped,
        }
    }

    /// Clear every queue, rate-limit window, breaker and counter.
    pub fn reset(&self) {
        self.store.write().reset();
        self.fallback.reset();
        self.rate_limiter.clear();
        self.join_guard.reset();
        self.status_guard.reset();
        self.metrics.reset();
        warn!("Queue state reset by admin");
    }
}
