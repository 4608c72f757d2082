//! Request middleware
//!
//! - Request logging with the acting user (`X-User-Id`)
//! - Request metrics for Prometheus

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::telemetry::SpecflowMetrics;

/// Header naming the acting user
pub const USER_ID_HEADER: &str = "x-user-id";

fn header_or<'a>(request: &'a Request, name: &str, fallback: &'a str) -> &'a str {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback)
}

/// Logs method, path, status, duration and acting user of every request
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = header_or(&request, "x-request-id", "unknown").to_string();
    let user_id = header_or(&request, USER_ID_HEADER, "anonymous").to_string();

    let start = Instant::now();

    tracing::debug!(
        request_id = %request_id,
        user_id = %user_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

/// Counts requests by method and status
pub async fn telemetry_middleware(
    State(metrics): State<Arc<SpecflowMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;
    metrics.record_http_request(method.as_str(), response.status().as_u16());
    response
}
