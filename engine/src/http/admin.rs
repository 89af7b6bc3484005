//! Admin handlers. Mounted behind bearer-token auth.

use axum::{body::Bytes, extract::State, response::Json};

use crate::error::QueueError;
use crate::queue::admin::{AdminStats, FallbackToggle};
use crate::queue::types::{AutoPromotionConfigPatch, ProcessResult};
use crate::queue::SchedulerStatus;

use super::types::{parse_json, AppState, FallbackRequest, OkResponse, ProcessRequest};

/// Promote clients from the front of the queue now.
#[utoipa::path(
    post,
    path = "/admin/process",
    tag = "Admin",
    request_body = ProcessRequest,
    responses(
        (status = 200, description = "Clients promoted", body = ProcessResult),
        (status = 400, description = "count outside 1..=1000"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearer" = []))
)]
pub async fn process_queue(
    State(qm): State<AppState>,
    body: Bytes,
) -> Result<Json<ProcessResult>, QueueError> {
    let req: ProcessRequest = parse_json(&body)?;
    Ok(Json(qm.process_queue(req.count)?))
}

/// Queue, scheduler, circuit and counter statistics.
#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Admin statistics", body = AdminStats),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearer" = []))
)]
pub async fn admin_stats(State(qm): State<AppState>) -> Json<AdminStats> {
    Json(qm.admin_stats())
}

/// Auto-promotion scheduler status.
#[utoipa::path(
    get,
    path = "/admin/scheduler",
    tag = "Admin",
    responses(
        (status = 200, description = "Scheduler status", body = SchedulerStatus),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearer" = []))
)]
pub async fn get_scheduler(State(qm): State<AppState>) -> Json<SchedulerStatus> {
    Json(qm.scheduler_status())
}

/// Patch the scheduler configuration. Absent fields keep their value.
#[utoipa::path(
    post,
    path = "/admin/scheduler",
    tag = "Admin",
    request_body = AutoPromotionConfigPatch,
    responses(
        (status = 200, description = "Updated scheduler status", body = SchedulerStatus),
        (status = 400, description = "Invalid configuration"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearer" = []))
)]
pub async fn update_scheduler(
    State(qm): State<AppState>,
    body: Bytes,
) -> Result<Json<SchedulerStatus>, QueueError> {
    let patch: AutoPromotionConfigPatch = parse_json(&body)?;
    qm.update_scheduler(&patch)?;
    Ok(Json(qm.scheduler_status()))
}

/// Enter or leave fallback mode. Leaving drains the fallback queue.
#[utoipa::path(
    post,
    path = "/admin/fallback",
    tag = "Admin",
    request_body = FallbackRequest,
    responses(
        (status = 200, description = "Fallback mode changed", body = FallbackToggle),
        (status = 400, description = "Missing enabled flag"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearer" = []))
)]
pub async fn set_fallback(
    State(qm): State<AppState>,
    body: Bytes,
) -> Result<Json<FallbackToggle>, QueueError> {
    let req: FallbackRequest = parse_json(&body)?;
    Ok(Json(qm.set_fallback_mode(req.enabled)))
}

/// Clear all queue state.
#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "Admin",
    responses(
        (status = 200, description = "State cleared", body = OkResponse),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearer" = []))
)]
pub async fn reset_queue(State(qm): State<AppState>) -> Json<OkResponse> {
    qm.reset();
    Json(OkResponse::new("Queue state reset"))
}
