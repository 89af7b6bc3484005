//! Client-facing results of queue operations.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Allowed,
    Waiting,
    NotInQueue,
}

/// Answer to join and status calls.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueTicket {
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_in_queue: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<u64>,
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback_mode: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub auto_approved: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl QueueTicket {
    pub fn allowed(message: impl Into<String>) -> Self {
        Self {
            status: TicketStatus::Allowed,
            position: None,
            total_in_queue: None,
            estimated_wait_minutes: None,
            message: message.into(),
            fallback_mode: false,
            auto_approved: false,
            degraded: false,
        }
    }

    pub fn waiting(position: usize, total: usize, wait_minutes: u64, message: impl Into<String>) -> Self {
        Self {
            status: TicketStatus::Waiting,
            position: Some(position),
            total_in_queue: Some(total),
            estimated_wait_minutes: Some(wait_minutes),
            ..Self::allowed(message)
        }
    }

    pub fn not_in_queue(total: usize, message: impl Into<String>) -> Self {
        Self {
            status: TicketStatus::NotInQueue,
            total_in_queue: Some(total),
            ..Self::allowed(message)
        }
    }

    pub fn with_fallback(mut self) -> Self {
        self.fallback_mode = true;
        self
    }

    pub fn with_auto_approved(mut self) -> Self {
        self.auto_approved = true;
        self
    }

    pub fn with_degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    #[inline]
    pub fn is_allowed(&self) -> bool {
        self.status == TicketStatus::Allowed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveResult {
    pub success: bool,
    pub remaining_in_queue: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    pub processed_count: usize,
    pub remaining_in_queue: usize,
    pub processed_users: Vec<String>,
}

/// Minutes a client at `position` should expect to wait.
#[inline]
pub fn estimate_wait_minutes(position: usize, minutes_per_position: f64) -> u64 {
    (position as f64 * minutes_per_position).ceil().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_estimate_rounds_up() {
        assert_eq!(estimate_wait_minutes(1, 2.0), 2);
        assert_eq!(estimate_wait_minutes(3, 3.0), 9);
        assert_eq!(estimate_wait_minutes(3, 0.5), 2);
    }

    #[test]
    fn test_ticket_omits_empty_fields() {
        let json = serde_json::to_value(QueueTicket::allowed("ok").with_auto_approved()).unwrap();
        assert_eq!(json["status"], "allowed");
        assert_eq!(json["autoApproved"], true);
        assert!(json.get("position").is_none());
        assert!(json.get("fallbackMode").is_none());

        let json = serde_json::to_value(QueueTicket::not_in_queue(4, "no")).unwrap();
        assert_eq!(json["status"], "not_in_queue");
        assert_eq!(json["totalInQueue"], 4);
    }
}
