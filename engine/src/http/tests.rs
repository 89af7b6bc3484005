//! HTTP API integration tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{create_cors_layer, create_router, AppState, CAPTCHA_HEADER};
use crate::queue::types::{AutoPromotionConfig, RateLimitPolicy, RateLimitSettings};
use crate::queue::{QueueConfig, QueueManager};

/// One admission slot, no direct approvals past it, scheduler off.
fn config() -> QueueConfig {
    QueueConfig {
        max_queue_size: 2,
        auto_approve_threshold: 0,
        rate_limits: RateLimitSettings {
            join: RateLimitPolicy {
                max_requests: 2,
                window_ms: 60_000,
            },
            status: RateLimitPolicy {
                max_requests: 60,
                window_ms: 60_000,
            },
        },
        auto_promotion: AutoPromotionConfig {
            enabled: false,
            max_concurrent_admitted: 1,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn create_test_app() -> (Router, AppState) {
    create_test_app_with(config())
}

fn create_test_app_with(config: QueueConfig) -> (Router, AppState) {
    let state: AppState = QueueManager::new(config);
    (create_router(state.clone(), None), state)
}

fn as_client(builder: axum::http::request::Builder, agent: &str) -> axum::http::request::Builder {
    builder
        .header("x-forwarded-for", "198.51.100.4")
        .header(header::USER_AGENT, agent)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn join(app: &Router, agent: &str) -> Response {
    let request = as_client(Request::post("/queue/join"), agent)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn admin_post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[test]
fn test_create_cors_layer_variants() {
    let _ = create_cors_layer(None);
    let _ = create_cors_layer(Some("*"));
    let _ = create_cors_layer(Some("http://localhost:3000,http://example.com"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();
    let response = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["fallbackMode"], false);
    assert_eq!(json["schedulerRunning"], false);
}

#[tokio::test]
async fn test_join_then_wait() {
    let (app, _) = create_test_app();

    let response = join(&app, "alpha").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "allowed");
    assert_eq!(json["autoApproved"], true);
    assert!(json.get("position").is_none());

    let json = body_json(join(&app, "beta").await).await;
    assert_eq!(json["status"], "waiting");
    assert_eq!(json["position"], 1);
    assert_eq!(json["totalInQueue"], 1);
    assert_eq!(json["estimatedWaitMinutes"], 2);
    assert!(json.get("fallbackMode").is_none());
}

#[tokio::test]
async fn test_join_accepts_captcha_header_without_verifier() {
    let (app, _) = create_test_app();
    let request = as_client(Request::post("/queue/join"), "alpha")
        .header(CAPTCHA_HEADER, "token")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_join_rate_limited() {
    let (app, _) = create_test_app();
    assert_eq!(join(&app, "alpha").await.status(), StatusCode::OK);
    assert_eq!(join(&app, "alpha").await.status(), StatusCode::OK);

    let response = join(&app, "alpha").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let json = body_json(response).await;
    assert_eq!(json["status"], "rate_limited");
    assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");
    assert!(json["resetAt"].as_u64().is_some());
}

#[tokio::test]
async fn test_join_queue_full() {
    let (app, _) = create_test_app();
    join(&app, "alpha").await;
    join(&app, "beta").await;
    join(&app, "gamma").await;

    let response = join(&app, "delta").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "QUEUE_FULL");
}

#[tokio::test]
async fn test_status_and_leave() {
    let (app, _) = create_test_app();
    let status = || {
        as_client(Request::get("/queue/status"), "beta")
            .body(Body::empty())
            .unwrap()
    };

    let json = body_json(send(&app, status()).await).await;
    assert_eq!(json["status"], "not_in_queue");
    assert_eq!(json["totalInQueue"], 0);

    join(&app, "alpha").await;
    join(&app, "beta").await;
    let json = body_json(send(&app, status()).await).await;
    assert_eq!(json["status"], "waiting");
    assert_eq!(json["position"], 1);

    let leave = as_client(Request::post("/queue/leave"), "beta")
        .body(Body::empty())
        .unwrap();
    let json = body_json(send(&app, leave).await).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["remainingInQueue"], 0);

    let json = body_json(send(&app, status()).await).await;
    assert_eq!(json["status"], "not_in_queue");
}

#[tokio::test]
async fn test_monitor_snapshot() {
    let (app, _) = create_test_app();
    join(&app, "alpha").await;
    join(&app, "beta").await;

    let response = send(&app, Request::get("/queue/monitor").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["queue"]["totalInQueue"], 1);
    assert_eq!(json["queue"]["allowedUsers"], 1);
    assert_eq!(json["autoProcessor"]["isEnabled"], false);
    assert_eq!(json["dashboard"]["currentUtilization"], "1/1");
    assert_eq!(json["dashboard"]["systemLoad"], "low");
}

#[tokio::test]
async fn test_admin_process() {
    let (app, _) = create_test_app();
    join(&app, "alpha").await;
    join(&app, "beta").await;
    join(&app, "gamma").await;

    let response = send(&app, admin_post("/admin/process", json!({ "count": 1 }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["processedCount"], 1);
    assert_eq!(json["remainingInQueue"], 1);
    assert_eq!(json["processedUsers"].as_array().map(Vec::len), Some(1));

    let response = send(
        &app,
        Request::post("/admin/process").body(Body::empty()).unwrap(),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["processedCount"], 1);
    assert_eq!(json["remainingInQueue"], 0);
}

#[tokio::test]
async fn test_admin_process_rejects_bad_count() {
    let (app, _) = create_test_app();

    for count in [0, -3, 1_001] {
        let response = send(&app, admin_post("/admin/process", json!({ "count": count }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "count {count}");
        assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
    }

    let malformed = Request::post("/admin/process")
        .body(Body::from("{\"count\":"))
        .unwrap();
    assert_eq!(send(&app, malformed).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_requires_token_when_configured() {
    let mut config = config();
    config.admin_tokens = vec!["s3cret".to_string()];
    let (app, _) = create_test_app_with(config);

    let response = send(&app, Request::get("/admin/stats").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::get("/admin/stats")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.status(), StatusCode::UNAUTHORIZED);

    let right = Request::get("/admin/stats")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, right).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["totalInQueue"], 0);
    assert_eq!(json["circuits"].as_array().map(Vec::len), Some(2));

    // Public routes stay open.
    assert_eq!(join(&app, "alpha").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_scheduler_update() {
    let (app, state) = create_test_app();

    let response = send(
        &app,
        admin_post("/admin/scheduler", json!({ "batchSize": 0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        admin_post(
            "/admin/scheduler",
            json!({ "batchSize": 3, "businessHours": { "start": "08:30" } }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["config"]["batchSize"], 3);
    assert_eq!(json["config"]["businessHours"]["start"], "08:30");
    assert_eq!(json["isRunning"], false);
    assert_eq!(state.scheduler().config().batch_size, 3);

    let response = send(&app, Request::get("/admin/scheduler").body(Body::empty()).unwrap()).await;
    assert_eq!(body_json(response).await["config"]["batchSize"], 3);
}

#[tokio::test]
async fn test_admin_fallback_toggle() {
    let (app, state) = create_test_app();

    let response = send(&app, admin_post("/admin/fallback", json!({ "enabled": true }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["fallbackMode"], true);

    let json = body_json(join(&app, "alpha").await).await;
    assert_eq!(json["status"], "waiting");
    assert_eq!(json["fallbackMode"], true);

    let response = send(&app, admin_post("/admin/fallback", json!({ "enabled": false }))).await;
    let json = body_json(response).await;
    assert_eq!(json["fallbackMode"], false);
    assert_eq!(json["requeued"], 1);
    assert!(!state.fallback().is_in_fallback_mode());

    let response = send(&app, admin_post("/admin/fallback", json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_reset() {
    let (app, _) = create_test_app();
    join(&app, "alpha").await;
    join(&app, "beta").await;

    let response = send(&app, admin_post("/admin/reset", json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let response = send(&app, Request::get("/admin/stats").body(Body::empty()).unwrap()).await;
    let json = body_json(response).await;
    assert_eq!(json["totalInQueue"], 0);
    assert_eq!(json["allowedUsers"], 0);
    assert_eq!(json["counters"]["joins"], 0);
}

#[tokio::test]
async fn test_docs_served() {
    let (app, _) = create_test_app();
    let response = send(&app, Request::get("/docs").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
}
