use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::services::AppState;

pub mod achievements;
pub mod auth;
pub mod lessons;
pub mod progress;

/// Health check endpoint. Reports degraded (503) when the store is
/// unreachable rather than failing the request outright.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let store_status = match state.store.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!("Health check: store unreachable: {}", e);
            "down"
        }
    };

    let healthy = store_status == "up";
    let body = json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "service": "kidcode-api",
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "store": store_status,
        },
    });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// Prometheus metrics endpoint
pub async fn metrics_handler() -> Response {
    match crate::metrics::render_metrics() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            tracing::error!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}

/// Basic auth gate in front of /metrics. Credentials come from the
/// METRICS_AUTH env var ("user:password").
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());

    let provided = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok());

    match provided {
        Some(credentials) if credentials == expected => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Lesson ids arrive as path strings; anything non-numeric is a client error
/// with the standard `{"error": ...}` body, not a bare 400 or a 404.
pub(crate) fn parse_lesson_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::Validation("Invalid lesson id".to_string()))
}

/// Run validator-derive checks and surface the first failure message.
pub(crate) fn validate_request<T: Validate>(req: &T) -> Result<(), ApiError> {
    req.validate().map_err(|errors| {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| "Invalid request".to_string());
        ApiError::Validation(message)
    })
}
