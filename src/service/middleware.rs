//! Service middleware for request metrics.
//!
//! ## Metrics Logged
//!
//! - `request` - path pattern, method, status, latency
//! - `collation` - witness count, graph size, latency per `/api/collate` call

use axum::{extract::Request, middleware::Next, response::Response};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    info!(
        target: "collation_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request_metric"
    );

    response
}

/// Replace config hashes in paths with a placeholder.
fn normalize_path(path: &str) -> String {
    static HASH: OnceLock<Regex> = OnceLock::new();
    let hash = HASH.get_or_init(|| {
        Regex::new(r"/[0-9a-f]{16}(/|$)").expect("static hash pattern compiles")
    });
    hash.replace_all(path, "/:hash$1").to_string()
}

/// Record one collation run.
pub fn record_collation_metrics(witnesses: usize, vertices: usize, edges: usize, latency_ms: u64) {
    info!(
        target: "collation_kernel::metrics",
        metric_type = "collation",
        witnesses = witnesses,
        vertices = vertices,
        edges = edges,
        latency_ms = latency_ms,
        "collation_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_hash() {
        assert_eq!(normalize_path("/api/configs/9f3a0c11d2e4b587"), "/api/configs/:hash");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
        assert_eq!(normalize_path("/api/collate"), "/api/collate");
    }
}
