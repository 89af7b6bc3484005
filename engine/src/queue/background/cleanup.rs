//! Periodic cleanup of expired rate-limit windows.

use tracing::debug;

use super::super::manager::QueueManager;
use super::super::types::now_ms;

impl QueueManager {
    pub(crate) fn run_cleanup_tasks(&self) {
        self.cleanup_rate_limit_windows();
    }

    pub(crate) fn cleanup_rate_limit_windows(&self) -> usize {
        let removed = self.rate_limiter.sweep(now_ms());
        if removed > 0 {
            debug!(
                removed,
                remaining = self.rate_limiter.tracked_windows(),
                "Swept expired rate limit windows"
            );
        }
        removed
    }
}
