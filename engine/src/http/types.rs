//! HTTP API request and response types.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::QueueError;
use crate::queue::types::{client_origin, derive_client_id};
use crate::queue::QueueManager;

/// Shared application state.
pub type AppState = Arc<QueueManager>;

pub const CAPTCHA_HEADER: &str = "x-captcha-token";

fn default_process_count() -> i64 {
    5
}

/// Manual promotion request. An empty body promotes five clients.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessRequest {
    #[serde(default = "default_process_count")]
    pub count: i64,
}

/// Fallback mode toggle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FallbackRequest {
    pub enabled: bool,
}

/// Health check response.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_ms: u64,
    pub fallback_mode: bool,
    pub scheduler_running: bool,
}

/// Generic acknowledgement.
#[derive(Serialize, ToSchema)]
pub struct OkResponse {
    pub success: bool,
    pub message: String,
}

impl OkResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Decode a JSON body, treating an empty body as `{}`.
///
/// Malformed input maps to [`QueueError::InvalidInput`] so every body error
/// answers 400 with the usual error envelope.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, QueueError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| QueueError::InvalidInput(e.to_string()))
}

// ============== Client identity ==============

/// Who is calling, as far as the waiting room can tell.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_ip: Option<String>,
    pub captcha_token: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let client_ip = client_origin(
            header_str(headers, "x-forwarded-for"),
            header_str(headers, "x-real-ip"),
        )
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        let client_id = derive_client_id(
            client_ip.as_deref(),
            header_str(headers, "user-agent"),
        );
        let captcha_token = header_str(headers, CAPTCHA_HEADER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            client_id,
            client_ip,
            captcha_token,
        })
    }
}
