//! Queue error taxonomy and its HTTP mapping.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::queue::types::{now_ms, RateScope};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Rate limit exceeded for {scope}, retry after {reset_at}")]
    RateLimitExceeded { scope: RateScope, reset_at: u64 },

    #[error("Queue is currently full. Please try again later.")]
    QueueFull,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Circuit breaker is open for {operation}")]
    CircuitOpen { operation: &'static str },

    #[error("Queue backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Unexpected failure: {0}")]
    UnknownFailure(String),
}

impl QueueError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueueError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            QueueError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            QueueError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            QueueError::CircuitOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
            QueueError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            QueueError::UnknownFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            QueueError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            QueueError::QueueFull => "QUEUE_FULL",
            QueueError::InvalidInput(_) => "INVALID_INPUT",
            QueueError::CircuitOpen { .. } => "CIRCUIT_BREAKER_OPEN",
            QueueError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            QueueError::UnknownFailure(_) => "UNKNOWN_FAILURE",
        }
    }

    /// Transient failures worth another attempt.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::BackendUnavailable(_))
    }

    /// Message safe to show end users.
    pub fn user_message(&self) -> String {
        match self {
            QueueError::RateLimitExceeded { scope, .. } => match scope {
                RateScope::Join => {
                    "Too many requests. Please wait a moment before trying again.".to_string()
                }
                RateScope::Status => "Too many status checks. Please wait a moment.".to_string(),
            },
            QueueError::QueueFull => self.to_string(),
            QueueError::InvalidInput(_) => self.to_string(),
            QueueError::CircuitOpen { .. } | QueueError::BackendUnavailable(_) => {
                "The queue is temporarily degraded. Please try again shortly.".to_string()
            }
            QueueError::UnknownFailure(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let QueueError::RateLimitExceeded { reset_at, .. } = self {
            let retry_after_secs = reset_at.saturating_sub(now_ms()).div_ceil(1000).max(1);
            let body = Json(json!({
                "success": false,
                "status": "rate_limited",
                "error": "Rate limit exceeded",
                "code": self.code(),
                "message": self.user_message(),
                "resetAt": reset_at,
            }));
            let mut response = (status, body).into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            return response;
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
            "message": self.user_message(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(QueueError::QueueFull.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            QueueError::InvalidInput("count".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            QueueError::RateLimitExceeded {
                scope: RateScope::Join,
                reset_at: 0
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            QueueError::UnknownFailure("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_only_backend_failures_retry() {
        assert!(QueueError::BackendUnavailable("down".into()).is_retryable());
        assert!(!QueueError::QueueFull.is_retryable());
        assert!(!QueueError::CircuitOpen { operation: "join" }.is_retryable());
    }

    #[test]
    fn test_rate_limit_response_has_retry_after() {
        let err = QueueError::RateLimitExceeded {
            scope: RateScope::Join,
            reset_at: now_ms() + 30_000,
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap();
        assert!((29..=30).contains(&retry_after));
    }
}
