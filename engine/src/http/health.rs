//! Liveness endpoint.

use std::sync::OnceLock;
use std::time::Instant;

use axum::{extract::State, response::Json};

use super::types::{AppState, HealthResponse};

static START_TIME: OnceLock<Instant> = OnceLock::new();

pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Health check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(qm): State<AppState>) -> Json<HealthResponse> {
    let uptime_ms = START_TIME
        .get()
        .map(|t| t.elapsed().as_millis() as u64)
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy",
        uptime_ms,
        fallback_mode: qm.fallback().is_in_fallback_mode(),
        scheduler_running: qm.scheduler().is_running(),
    })
}
