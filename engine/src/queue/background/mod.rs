//! Background tasks for the waiting room.
//!
//! Module organization:
//! - `promotion.rs` - Auto-promotion scheduler (independent timer task)
//! - `cleanup.rs` - Rate-limit window sweeping

mod cleanup;
mod promotion;

use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use super::manager::QueueManager;

pub use promotion::{AutoPromotionScheduler, SchedulerMetrics, SchedulerStatus, TickOutcome};

const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

impl QueueManager {
    /// Run maintenance until shutdown.
    pub async fn background_tasks(self: Arc<Self>) {
        let mut sweep_ticker = interval(SWEEP_INTERVAL);
        sweep_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Background tasks started");

        loop {
            if self.is_shutdown() {
                info!("Background tasks received shutdown signal, stopping...");
                self.scheduler.stop();
                info!("Background tasks stopped");
                return;
            }

            tokio::select! {
                _ = sweep_ticker.tick() => {
                    self.run_cleanup_tasks();
                }
                _ = self.shutdown_notify.notified() => {}
            }
        }
    }
}
