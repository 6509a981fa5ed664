//! Request logging middleware

use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, error, info, warn, Instrument};

/// Log method, path, status and latency for every request
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let span = tracing::info_span!("http.request", method = %method, path = %path);
    let response = next.run(request).instrument(span).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        error!(method = %method, path = %path, status, latency_ms, "Request failed");
    } else if response.status().is_client_error() {
        warn!(method = %method, path = %path, status, latency_ms, "Request rejected");
    } else if path == "/health" {
        debug!(status, latency_ms, "Health check served");
    } else {
        info!(method = %method, path = %path, status, latency_ms, "Request completed");
    }

    response
}
