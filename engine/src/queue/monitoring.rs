//! Public monitoring snapshot.

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::manager::QueueManager;
use super::types::{now_ms, BusinessHours};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SystemLoad {
    Low,
    Medium,
    High,
}

impl SystemLoad {
    pub fn from_waiting(total: usize) -> Self {
        if total > 20 {
            SystemLoad::High
        } else if total > 10 {
            SystemLoad::Medium
        } else {
            SystemLoad::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitorQueue {
    pub total_in_queue: usize,
    pub allowed_users: usize,
    pub oldest_in_queue: Option<u64>,
    pub estimated_wait_minutes: u64,
    pub next_processing_in_seconds: u64,
    pub users_per_batch: usize,
    pub max_concurrent_users: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitorProcessor {
    pub is_running: bool,
    pub is_enabled: bool,
    pub interval_seconds: u64,
    pub business_hours: BusinessHours,
    pub within_business_hours: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitorDashboard {
    /// `"admitted/max"`.
    pub current_utilization: String,
    pub queue_efficiency: String,
    pub average_wait_time: String,
    pub system_load: SystemLoad,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub timestamp: u64,
    pub queue: MonitorQueue,
    pub auto_processor: MonitorProcessor,
    pub fallback_mode: bool,
    pub dashboard: MonitorDashboard,
}

impl QueueManager {
    pub fn monitor(&self) -> MonitorSnapshot {
        let stats = self.store.read().stats();
        let status = self.scheduler.status(Utc::now());
        let config = status.config;

        let batch = config.batch_size.max(1);
        let estimated_wait_minutes = (stats.total_waiting.div_ceil(batch) as u64).max(1);
        let interval_seconds = config.interval_ms / 1_000;

        MonitorSnapshot {
            timestamp: now_ms(),
            queue: MonitorQueue {
                total_in_queue: stats.total_waiting,
                allowed_users: stats.total_admitted,
                oldest_in_queue: stats.oldest_joined_at,
                estimated_wait_minutes,
                next_processing_in_seconds: interval_seconds,
                users_per_batch: config.batch_size,
                max_concurrent_users: config.max_concurrent_admitted,
            },
            auto_processor: MonitorProcessor {
                is_running: status.is_running,
                is_enabled: config.enabled,
                interval_seconds,
                business_hours: config.business_hours,
                within_business_hours: status.within_business_hours,
            },
            fallback_mode: self.fallback.is_in_fallback_mode(),
            dashboard: MonitorDashboard {
                current_utilization: format!(
                    "{}/{}",
                    stats.total_admitted, config.max_concurrent_admitted
                ),
                queue_efficiency: if stats.total_waiting > 0 {
                    "processing".to_string()
                } else {
                    "idle".to_string()
                },
                average_wait_time: format!("{estimated_wait_minutes} minutes"),
                system_load: SystemLoad::from_waiting(stats.total_waiting),
            },
        }
    }
}
