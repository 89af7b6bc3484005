//! Admin tests: manual processing, stats, config, reset.

use super::*;
use crate::queue::types::AutoPromotionConfigPatch;

#[tokio::test]
async fn test_process_bypasses_concurrency_ceiling() {
    let qm = setup();
    join_many(&qm, 6).await;

    let result = qm.process_queue(10).unwrap();
    assert_eq!(result.processed_users, vec!["c4", "c5", "c6"]);
    assert_eq!(result.processed_count, 3);
    assert_eq!(result.remaining_in_queue, 0);

    let stats = qm.admin_stats();
    assert_eq!(stats.allowed_users, 6);
    assert_eq!(stats.counters.admin_promoted, 3);
}

#[tokio::test]
async fn test_process_validates_count() {
    let qm = setup();
    for count in [0, -5, 1_001] {
        assert!(matches!(
            qm.process_queue(count),
            Err(QueueError::InvalidInput(_))
        ));
    }
    assert!(qm.process_queue(1_000).is_ok());
}

#[tokio::test]
async fn test_stats_shape() {
    let qm = setup();
    join_many(&qm, 4).await;

    let stats = qm.admin_stats();
    assert_eq!(stats.total_in_queue, 1);
    assert_eq!(stats.allowed_users, 3);
    assert!(stats.oldest_in_queue.is_some());
    assert!(!stats.scheduler.is_running);
    assert_eq!(stats.circuits.len(), 2);
    assert_eq!(stats.circuits[1].operation, "status");
    assert_eq!(stats.counters.joins, 4);
    assert_eq!(stats.counters.enqueued, 1);
    assert_eq!(stats.rate_limit_windows, 4);
}

#[tokio::test]
async fn test_update_scheduler_validates() {
    let qm = setup();
    let err = qm
        .update_scheduler(&AutoPromotionConfigPatch {
            interval_ms: Some(5),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, QueueError::InvalidInput(_)));

    let next = qm
        .update_scheduler(&AutoPromotionConfigPatch {
            batch_size: Some(7),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(next.batch_size, 7);
    assert_eq!(qm.scheduler_status().config.batch_size, 7);
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let qm = setup();
    join_many(&qm, 5).await;
    qm.set_fallback_mode(true);
    qm.join("f1", None, None).await.unwrap();

    qm.reset();
    let stats = qm.admin_stats();
    assert_eq!(stats.total_in_queue, 0);
    assert_eq!(stats.allowed_users, 0);
    assert!(!stats.fallback_mode);
    assert_eq!(stats.fallback_queue_size, 0);
    assert_eq!(stats.rate_limit_windows, 0);
    assert_eq!(stats.counters, types::QueueCounters::default());
}

#[tokio::test]
async fn test_monitor_snapshot() {
    let qm = setup();
    join_many(&qm, 8).await;

    let snapshot = qm.monitor();
    assert_eq!(snapshot.queue.total_in_queue, 5);
    // ceil(5 / batch 2)
    assert_eq!(snapshot.queue.estimated_wait_minutes, 3);
    assert_eq!(snapshot.dashboard.current_utilization, "3/3");
    assert_eq!(snapshot.dashboard.queue_efficiency, "processing");
    assert_eq!(snapshot.dashboard.system_load, monitoring::SystemLoad::Low);

    qm.reset();
    assert_eq!(qm.monitor().queue.estimated_wait_minutes, 1);
}

#[tokio::test]
async fn test_admin_tokens() {
    let qm = setup();
    assert!(!qm.has_admin_tokens());
    assert!(qm.verify_token("anything"));

    let mut cfg = config();
    cfg.admin_tokens = vec!["s3cret".to_string()];
    let qm = QueueManager::new(cfg);
    assert!(qm.verify_token("s3cret"));
    assert!(!qm.verify_token("s3cre"));
    assert!(!qm.verify_token(""));
}
