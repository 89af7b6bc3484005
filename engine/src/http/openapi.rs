//! OpenAPI documentation for the waiting-room HTTP API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::http::{admin, health, queue};
use crate::queue::admin::{AdminStats, FallbackToggle};
use crate::queue::monitoring::{
    MonitorDashboard, MonitorProcessor, MonitorQueue, MonitorSnapshot, SystemLoad,
};
use crate::queue::resilience::CircuitSnapshot;
use crate::queue::types::{
    AutoPromotionConfig, AutoPromotionConfigPatch, BusinessHours, BusinessHoursPatch,
    CircuitState, LeaveResult, ProcessResult, QueueCounters, QueueTicket, TicketStatus,
};
use crate::queue::{SchedulerMetrics, SchedulerStatus};

use super::types::{FallbackRequest, HealthResponse, OkResponse, ProcessRequest};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "waitroom API",
        description = "Virtual waiting room: FIFO admission, rate limiting and graceful degradation",
        license(name = "MIT")
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Queue", description = "Join, poll and leave the waiting room"),
        (name = "Admin", description = "Manual promotion, scheduler and fallback control"),
        (name = "Health", description = "Health checks")
    ),
    paths(
        queue::join_queue,
        queue::queue_status,
        queue::leave_queue,
        queue::monitor_queue,
        admin::process_queue,
        admin::admin_stats,
        admin::get_scheduler,
        admin::update_scheduler,
        admin::set_fallback,
        admin::reset_queue,
        health::health_check,
    ),
    components(schemas(
        QueueTicket,
        TicketStatus,
        LeaveResult,
        ProcessResult,
        MonitorSnapshot,
        MonitorQueue,
        MonitorProcessor,
        MonitorDashboard,
        SystemLoad,
        AdminStats,
        FallbackToggle,
        SchedulerStatus,
        SchedulerMetrics,
        AutoPromotionConfig,
        AutoPromotionConfigPatch,
        BusinessHours,
        BusinessHoursPatch,
        CircuitSnapshot,
        CircuitState,
        QueueCounters,
        ProcessRequest,
        FallbackRequest,
        HealthResponse,
        OkResponse,
    ))
)]
pub struct ApiDoc;
