//! Backing-store hook invoked inside guarded queue operations.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::error::QueueError;

/// Which guarded operation is talking to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOp {
    Join,
    Status,
}

impl BackendOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendOp::Join => "join",
            BackendOp::Status => "status",
        }
    }
}

impl fmt::Display for BackendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External store the queue mirrors its operations into.
///
/// A failure here is transient by contract and must be reported as
/// [`QueueError::BackendUnavailable`] so the resilience layer retries it.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Round-trip for `op` on behalf of `client_id`.
    async fn sync(&self, op: BackendOp, client_id: &str) -> Result<(), QueueError>;
}

/// In-process backend that fails a configurable fraction of calls.
pub struct MockBackend {
    // f64 bits, so the rate can change at runtime without a lock.
    failure_rate: AtomicU64,
}

impl MockBackend {
    pub fn new(failure_rate: f64) -> Self {
        Self {
            failure_rate: AtomicU64::new(failure_rate.clamp(0.0, 1.0).to_bits()),
        }
    }

    pub fn failure_rate(&self) -> f64 {
        f64::from_bits(self.failure_rate.load(Ordering::Relaxed))
    }

    pub fn set_failure_rate(&self, rate: f64) {
        self.failure_rate
            .store(rate.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[async_trait]
impl QueueBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn sync(&self, op: BackendOp, client_id: &str) -> Result<(), QueueError> {
        let rate = self.failure_rate();
        if rate > 0.0 && rand::rng().random_bool(rate) {
            debug!(op = %op, client_id, "Mock backend injected failure");
            return Err(QueueError::BackendUnavailable(format!(
                "mock backend failed {op}"
            )));
        }
        Ok(())
    }
}
