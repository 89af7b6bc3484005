//! Join operation.

use tracing::{debug, info, warn};

use super::backend::BackendOp;
use super::manager::QueueManager;
use super::types::{estimate_wait_minutes, EnqueueOutcome, QueueTicket, RateScope};
use crate::error::QueueError;

impl QueueManager {
    /// Put `client_id` in line, or admit it straight away when the queue is
    /// nearly idle.
    ///
    /// Falls back to the secondary store when the guarded path reports an
    /// open circuit or exhausted retries.
    pub async fn join(
        &self,
        client_id: &str,
        captcha_token: Option<&str>,
        client_ip: Option<&str>,
    ) -> Result<QueueTicket, QueueError> {
        self.check_rate_limit(client_id, RateScope::Join)?;
        self.metrics.record_join();
        self.verify_captcha(captcha_token, client_ip).await;

        if self.store.read().is_admitted(client_id) {
            debug!(client_id, "Join from already admitted client");
            return Ok(QueueTicket::allowed("You are already allowed to proceed"));
        }

        if self.fallback.is_in_fallback_mode() {
            return self.join_fallback(client_id);
        }

        match self.join_guard.execute(|| self.guarded_join(client_id)).await {
            Ok(ticket) => Ok(ticket),
            Err(err @ (QueueError::CircuitOpen { .. } | QueueError::UnknownFailure(_))) => {
                warn!(client_id, error = %err, "Join degraded to fallback queue");
                self.fallback.enable_fallback();
                self.metrics.record_degraded();
                self.join_fallback(client_id).map(QueueTicket::with_degraded)
            }
            Err(err) => Err(err),
        }
    }

    async fn guarded_join(&self, client_id: &str) -> Result<QueueTicket, QueueError> {
        self.backend.sync(BackendOp::Join, client_id).await?;
        let max_admitted = self.scheduler.config().max_concurrent_admitted;

        let mut store = self.store.write();
        if store.is_admitted(client_id) {
            return Ok(QueueTicket::allowed("You are already allowed to proceed"));
        }

        let admitted = store.admitted_len();
        let below_ceiling = !self.config.cap_idle_admission || admitted < max_admitted;
        let idle = admitted < self.config.auto_approve_threshold
            || (store.waiting_len() == 0 && below_ceiling);
        if idle && !store.is_waiting(client_id) {
            store.admit(client_id);
            drop(store);
            self.metrics.record_auto_approved();
            info!(client_id, "Client auto-approved");
            return Ok(QueueTicket::allowed(
                "You have been automatically approved to proceed",
            )
            .with_auto_approved());
        }

        let factor = self.config.wait_minutes_per_position;
        match store.enqueue(client_id) {
            EnqueueOutcome::Enqueued { position } => {
                let total = store.waiting_len();
                drop(store);
                self.metrics.record_enqueued();
                info!(client_id, position, total, "Client joined queue");
                Ok(QueueTicket::waiting(
                    position,
                    total,
                    estimate_wait_minutes(position, factor),
                    "You have been added to the queue",
                ))
            }
            EnqueueOutcome::AlreadyWaiting { position } => Ok(QueueTicket::waiting(
                position,
                store.waiting_len(),
                estimate_wait_minutes(position, factor),
                "You are already in the queue",
            )),
            EnqueueOutcome::Admitted => {
                Ok(QueueTicket::allowed("You are already allowed to proceed"))
            }
            EnqueueOutcome::Full => {
                warn!(client_id, capacity = store.capacity(), "Queue full, join rejected");
                Err(QueueError::QueueFull)
            }
        }
    }

    fn join_fallback(&self, client_id: &str) -> Result<QueueTicket, QueueError> {
        let factor = self.config.fallback_wait_minutes_per_position;
        let (position, message) = match self.fallback.enqueue(client_id) {
            EnqueueOutcome::Enqueued { position } => {
                self.metrics.record_fallback_join();
                info!(client_id, position, "Client joined fallback queue");
                (position, "You have been added to the queue (fallback mode)")
            }
            EnqueueOutcome::AlreadyWaiting { position } => {
                (position, "You are already in the queue (fallback mode)")
            }
            EnqueueOutcome::Full | EnqueueOutcome::Admitted => return Err(QueueError::QueueFull),
        };
        Ok(QueueTicket::waiting(
            position,
            self.fallback.size(),
            estimate_wait_minutes(position, factor),
            message,
        )
        .with_fallback())
    }
}
