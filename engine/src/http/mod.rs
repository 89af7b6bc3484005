//! HTTP API module.
//!
//! Public waiting-room endpoints under `/queue`, token-protected admin
//! endpoints under `/admin`, plus health and OpenAPI docs.

mod admin;
mod health;
mod openapi;
mod queue;
mod types;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use openapi::ApiDoc;
pub use types::{AppState, ClientIdentity, CAPTCHA_HEADER};

/// Bearer-token check for admin routes.
/// Every token is accepted when none are configured.
async fn auth_middleware(State(qm): State<AppState>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .unwrap_or("");

    if !qm.verify_token(token) {
        return (
            StatusCode::UNAUTHORIZED,
            [("WWW-Authenticate", "Bearer")],
            "Invalid or missing authentication token",
        )
            .into_response();
    }

    next.run(request).await
}

/// Create CORS layer from a comma-separated origin list.
/// Unset, empty or `*` allows all origins.
fn create_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) if !origins.is_empty() && origins != "*" => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::HeaderName::from_static(CAPTCHA_HEADER),
                ])
                .expose_headers([header::RETRY_AFTER])
        }
        _ => CorsLayer::permissive(),
    }
}

/// Create the HTTP router with all API routes.
pub fn create_router(state: AppState, cors_allow_origin: Option<&str>) -> Router {
    health::init_start_time();

    let queue_routes = Router::new()
        .route("/queue/join", post(queue::join_queue))
        .route("/queue/status", get(queue::queue_status))
        .route("/queue/leave", post(queue::leave_queue))
        .route("/queue/monitor", get(queue::monitor_queue))
        .route("/health", get(health::health_check));

    let admin_routes = Router::new()
        .route("/admin/process", post(admin::process_queue))
        .route("/admin/stats", get(admin::admin_stats))
        .route(
            "/admin/scheduler",
            get(admin::get_scheduler).post(admin::update_scheduler),
        )
        .route("/admin/fallback", post(admin::set_fallback))
        .route("/admin/reset", post(admin::reset_queue))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(queue_routes)
        .merge(admin_routes)
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(cors_allow_origin))
}

#[cfg(test)]
mod tests;
