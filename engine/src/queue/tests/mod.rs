//! QueueManager tests.

use std::sync::Arc;

use super::backend::MockBackend;
use super::resilience::RetryPolicy;
use super::types::{AutoPromotionConfig, CircuitBreakerConfig, CircuitState, TicketStatus};
use super::*;
use crate::error::QueueError;

mod admin;

/// Three admission slots, auto-promotion off, fast retries.
fn config() -> QueueConfig {
    QueueConfig {
        max_queue_size: 100,
        retry: RetryPolicy {
            max_attempts: 2,
            base_delay_ms: 10,
            max_delay_ms: 100,
            jitter_ms: 0,
        },
        join_breaker: CircuitBreakerConfig {
            failure_threshold: 2,
            cooldown_ms: 30_000,
        },
        status_breaker: CircuitBreakerConfig {
            failure_threshold: 2,
            cooldown_ms: 15_000,
        },
        auto_promotion: AutoPromotionConfig {
            enabled: false,
            interval_ms: 1_000,
            batch_size: 2,
            max_concurrent_admitted: 3,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn setup() -> Arc<QueueManager> {
    QueueManager::new(config())
}

fn setup_with_backend(config: QueueConfig) -> (Arc<QueueManager>, Arc<MockBackend>) {
    let backend = Arc::new(MockBackend::default());
    let qm = QueueManager::with_components(config, backend.clone(), None);
    (qm, backend)
}

/// Join `n` clients named `c1..cn`, returning their tickets.
async fn join_many(qm: &QueueManager, n: usize) -> Vec<types::QueueTicket> {
    let mut tickets = Vec::with_capacity(n);
    for i in 1..=n {
        tickets.push(qm.join(&format!("c{i}"), None, None).await.unwrap());
    }
    tickets
}
