//! Status operation.

use tracing::warn;

use super::backend::BackendOp;
use super::manager::QueueManager;
use super::types::{estimate_wait_minutes, QueueTicket, RateScope};
use crate::error::QueueError;

impl QueueManager {
    /// Report where `client_id` stands.
    ///
    /// Also starts the auto-promotion timer if it should be running but is
    /// not, so a freshly booted service begins admitting on first poll.
    pub async fn status(&self, client_id: &str) -> Result<QueueTicket, QueueError> {
        self.check_rate_limit(client_id, RateScope::Status)?;
        self.scheduler.ensure_running();

        if self.store.read().is_admitted(client_id) {
            return Ok(QueueTicket::allowed("You are allowed to proceed"));
        }

        if self.fallback.is_in_fallback_mode() {
            return Ok(self.fallback_status(client_id));
        }

        match self.status_guard.execute(|| self.guarded_status(client_id)).await {
            Ok(ticket) => Ok(ticket),
            Err(err @ (QueueError::CircuitOpen { .. } | QueueError::UnknownFailure(_))) => {
                warn!(client_id, error = %err, "Status degraded to local read");
                self.metrics.record_degraded();
                Ok(self.local_status(client_id).with_degraded())
            }
            Err(err) => Err(err),
        }
    }

    async fn guarded_status(&self, client_id: &str) -> Result<QueueTicket, QueueError> {
        self.backend.sync(BackendOp::Status, client_id).await?;
        Ok(self.local_status(client_id))
    }

    /// Read the primary store without touching the backend.
    fn local_status(&self, client_id: &str) -> QueueTicket {
        let store = self.store.read();
        if store.is_admitted(client_id) {
            return QueueTicket::allowed("You are allowed to proceed");
        }
        let total = store.waiting_len();
        match store.position_of(client_id) {
            Some(position) => QueueTicket::waiting(
                position,
                total,
                estimate_wait_minutes(position, self.config.wait_minutes_per_position),
                format!("You are in queue. Position {position} of {total}"),
            ),
            None => QueueTicket::not_in_queue(total, "You are not currently in the queue"),
        }
    }

    fn fallback_status(&self, client_id: &str) -> QueueTicket {
        let total = self.fallback.size();
        let ticket = match self.fallback.position_of(client_id) {
            Some(position) => QueueTicket::waiting(
                position,
                total,
                estimate_wait_minutes(position, self.config.fallback_wait_minutes_per_position),
                format!("You are in queue (fallback mode). Position {position} of {total}"),
            ),
            None => QueueTicket::not_in_queue(total, "You are not currently in the queue"),
        };
        ticket.with_fallback()
    }
}
