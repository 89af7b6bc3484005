//! Leave operation.

use tracing::info;

use super::manager::QueueManager;
use super::types::LeaveResult;

impl QueueManager {
    /// Remove `client_id` from every list it is on. Idempotent.
    pub fn leave(&self, client_id: &str) -> LeaveResult {
        let (removed, remaining) = {
            let mut store = self.store.write();
            (store.remove(client_id), store.waiting_len())
        };
        let from_fallback = self.fallback.remove(client_id);

        if removed.was_waiting || removed.was_admitted || from_fallback {
            self.metrics.record_leave();
            info!(
                client_id,
                was_waiting = removed.was_waiting,
                was_admitted = removed.was_admitted,
                from_fallback,
                "Client left queue"
            );
        }

        let remaining_in_queue = if self.fallback.is_in_fallback_mode() {
            self.fallback.size()
        } else {
            remaining
        };
        LeaveResult {
            success: true,
            remaining_in_queue,
        }
    }
}
