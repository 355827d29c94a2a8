use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// One line per request: method, path, status and latency.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let start = Instant::now();
    let response = next.run(req).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), latency_ms, "request failed");
    } else if path.starts_with("/health") {
        tracing::trace!(%method, %path, status = status.as_u16(), latency_ms, "health probe");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), latency_ms, "request handled");
    }

    response
}
