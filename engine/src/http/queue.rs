//! Client-facing waiting-room handlers.

use axum::{extract::State, response::Json};

use crate::error::QueueError;
use crate::queue::monitoring::MonitorSnapshot;
use crate::queue::types::{LeaveResult, QueueTicket};

use super::types::{AppState, ClientIdentity};

/// Join the waiting room.
#[utoipa::path(
    post,
    path = "/queue/join",
    tag = "Queue",
    params(
        ("X-Captcha-Token" = Option<String>, Header, description = "reCAPTCHA v3 token")
    ),
    responses(
        (status = 200, description = "Admitted or placed in line", body = QueueTicket),
        (status = 429, description = "Join rate limit exceeded; see Retry-After"),
        (status = 503, description = "Queue is full")
    )
)]
pub async fn join_queue(
    State(qm): State<AppState>,
    identity: ClientIdentity,
) -> Result<Json<QueueTicket>, QueueError> {
    let ticket = qm
        .join(
            &identity.client_id,
            identity.captcha_token.as_deref(),
            identity.client_ip.as_deref(),
        )
        .await?;
    Ok(Json(ticket))
}

/// Current admission status of the caller.
#[utoipa::path(
    get,
    path = "/queue/status",
    tag = "Queue",
    responses(
        (status = 200, description = "Allowed, waiting or not in queue", body = QueueTicket),
        (status = 429, description = "Status rate limit exceeded; see Retry-After")
    )
)]
pub async fn queue_status(
    State(qm): State<AppState>,
    identity: ClientIdentity,
) -> Result<Json<QueueTicket>, QueueError> {
    Ok(Json(qm.status(&identity.client_id).await?))
}

/// Leave the waiting room.
#[utoipa::path(
    post,
    path = "/queue/leave",
    tag = "Queue",
    responses(
        (status = 200, description = "Caller removed from every queue", body = LeaveResult)
    )
)]
pub async fn leave_queue(State(qm): State<AppState>, identity: ClientIdentity) -> Json<LeaveResult> {
    Json(qm.leave(&identity.client_id))
}

/// Public queue dashboard.
#[utoipa::path(
    get,
    path = "/queue/monitor",
    tag = "Queue",
    responses(
        (status = 200, description = "Queue and auto-processor snapshot", body = MonitorSnapshot)
    )
)]
pub async fn monitor_queue(State(qm): State<AppState>) -> Json<MonitorSnapshot> {
    Json(qm.monitor())
}
