//! Access logging middleware.
//!
//! Logs method, path, response status and latency of every request.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        warn!(%method, %path, status, latency_ms, "request failed");
    } else {
        info!(%method, %path, status, latency_ms, "request");
    }

    response
}
