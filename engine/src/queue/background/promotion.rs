//! Timer-driven auto-promotion.
//!
//! Every `interval_ms` the scheduler admits up to `batch_size` clients from
//! the front of the waiting list, never letting the admitted set grow past
//! `max_concurrent_admitted`. Ticks outside business hours do nothing.

use std::panic::{catch_unwind, AssertUnwindSafe};
#[cfg(test)]
use std::sync::atomic::AtomicBool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use utoipa::ToSchema;

use crate::error::QueueError;
use crate::queue::types::{
    now_ms, AutoPromotionConfig, AutoPromotionConfigPatch, PromotionResult, QueueStore,
};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    OutsideBusinessHours,
    AtCapacity { admitted: usize },
    QueueEmpty,
    Promoted { result: PromotionResult, admitted: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerMetrics {
    pub ticks: u64,
    pub promoted_total: u64,
    pub skipped_ticks: u64,
    pub errors: u64,
    pub last_run_at: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub config: AutoPromotionConfig,
    pub within_business_hours: bool,
    pub metrics: SchedulerMetrics,
}

#[derive(Default)]
struct TickCounters {
    ticks: AtomicU64,
    promoted_total: AtomicU64,
    skipped_ticks: AtomicU64,
    errors: AtomicU64,
    last_run_at: AtomicU64,
}

struct SchedulerTask {
    handle: JoinHandle<()>,
    stop_tx: watch::Sender<bool>,
}

pub struct AutoPromotionScheduler {
    store: Arc<RwLock<QueueStore>>,
    config: RwLock<AutoPromotionConfig>,
    task: Mutex<Option<SchedulerTask>>,
    counters: TickCounters,
    #[cfg(test)]
    fail_next_tick: AtomicBool,
}

impl AutoPromotionScheduler {
    pub fn new(store: Arc<RwLock<QueueStore>>, config: AutoPromotionConfig) -> Arc<Self> {
        Arc::new(Self {
            store,
            config: RwLock::new(config),
            task: Mutex::new(None),
            counters: TickCounters::default(),
            #[cfg(test)]
            fail_next_tick: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn config(&self) -> AutoPromotionConfig {
        *self.config.read()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Spawn the timer. No-op when disabled or already running.
    ///
    /// Returns true if a new timer was started.
    pub fn start(self: &Arc<Self>) -> bool {
        let config = self.config();
        if !config.enabled {
            debug!("Auto-promotion disabled, not starting");
            return false;
        }

        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return false;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let period = Duration::from_millis(config.interval_ms);
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            scheduler.run(period, stop_rx).await;
        });
        *task = Some(SchedulerTask { handle, stop_tx });

        info!(
            interval_ms = config.interval_ms,
            batch_size = config.batch_size,
            max_concurrent = config.max_concurrent_admitted,
            business_hours = config.business_hours.enabled,
            "Auto-promotion started"
        );
        true
    }

    /// Stop the timer. Returns true if one was running.
    pub fn stop(&self) -> bool {
        let Some(task) = self.task.lock().take() else {
            return false;
        };
        // A closed channel also ends the loop, so the send result is irrelevant.
        let _ = task.stop_tx.send(true);
        task.handle.abort();
        info!("Auto-promotion stopped");
        true
    }

    /// Start the timer if it should be running but is not.
    pub fn ensure_running(self: &Arc<Self>) -> bool {
        if self.is_running() {
            return false;
        }
        self.start()
    }

    /// Apply a validated patch and restart the timer with the new settings.
    pub fn update_config(
        self: &Arc<Self>,
        patch: &AutoPromotionConfigPatch,
    ) -> Result<AutoPromotionConfig, QueueError> {
        let next = {
            let mut config = self.config.write();
            let next = config.apply(patch)?;
            *config = next;
            next
        };
        info!(?next, "Auto-promotion config updated");

        self.stop();
        if next.enabled {
            self.start();
        }
        Ok(next)
    }

    pub fn status(&self, now: DateTime<Utc>) -> SchedulerStatus {
        let config = self.config();
        SchedulerStatus {
            is_running: self.is_running(),
            config,
            within_business_hours: config.business_hours.contains(now),
            metrics: self.metrics(),
        }
    }

    pub fn metrics(&self) -> SchedulerMetrics {
        let last_run_at = self.counters.last_run_at.load(Ordering::Relaxed);
        SchedulerMetrics {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            promoted_total: self.counters.promoted_total.load(Ordering::Relaxed),
            skipped_ticks: self.counters.skipped_ticks.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            last_run_at: (last_run_at > 0).then_some(last_run_at),
        }
    }

    /// Run one promotion pass as of `now`.
    pub fn tick_at(&self, now: DateTime<Utc>) -> TickOutcome {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);
        self.counters.last_run_at.store(now_ms(), Ordering::Relaxed);

        let outcome = self.promote(now);
        match &outcome {
            TickOutcome::Promoted { result, .. } => {
                self.counters
                    .promoted_total
                    .fetch_add(result.promoted.len() as u64, Ordering::Relaxed);
            }
            _ => {
                self.counters.skipped_ticks.fetch_add(1, Ordering::Relaxed);
            }
        }
        outcome
    }

    fn promote(&self, now: DateTime<Utc>) -> TickOutcome {
        #[cfg(test)]
        if self.fail_next_tick.swap(false, Ordering::SeqCst) {
            panic!("injected tick failure");
        }

        let config = self.config();
        if !config.business_hours.contains(now) {
            return TickOutcome::OutsideBusinessHours;
        }

        let mut store = self.store.write();
        let admitted = store.admitted_len();
        let available = config.max_concurrent_admitted.saturating_sub(admitted);
        if available == 0 {
            return TickOutcome::AtCapacity { admitted };
        }
        if store.waiting_len() == 0 {
            return TickOutcome::QueueEmpty;
        }

        let result = store.promote_batch(config.batch_size.min(available));
        TickOutcome::Promoted {
            admitted: store.admitted_len(),
            result,
        }
    }

    async fn run(self: Arc<Self>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_tick(),
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        debug!("Auto-promotion loop received stop signal");
                        return;
                    }
                }
            }
        }
    }

    fn run_tick(&self) {
        match catch_unwind(AssertUnwindSafe(|| self.tick_at(Utc::now()))) {
            Ok(TickOutcome::Promoted { result, admitted }) if !result.promoted.is_empty() => {
                info!(
                    event = "auto_queue_processed",
                    promoted = result.promoted.len(),
                    remaining = result.remaining,
                    admitted,
                    "Auto-promoted waiting clients"
                );
            }
            Ok(TickOutcome::AtCapacity { admitted }) => {
                debug!(
                    admitted,
                    max = self.config().max_concurrent_admitted,
                    "Max concurrent admitted reached"
                );
            }
            Ok(_) => {}
            Err(panic) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(event = "auto_queue_error", error = %reason, "Auto-promotion tick failed");
            }
        }
    }
}

impl Drop for AutoPromotionScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.handle.abort();
        }
    }
}
