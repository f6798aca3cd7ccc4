//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in a tracing span, records Prometheus request metrics
//! under a normalized path and logs completion.

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::metrics;

/// Path segment after /scan/ is an opaque scan code.
static SCAN_CODE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^/scan/[^/]+").ok());

/// Normalize path for metrics/spans.
///
/// `/scan/{code}` is the only route with a variable segment; the code is
/// replaced with a placeholder so Prometheus label cardinality stays bounded.
pub fn normalize_path(path: &str) -> String {
    match SCAN_CODE_PATTERN.as_ref() {
        Some(pattern) => pattern.replace(path, "/scan/{code}").into_owned(),
        None => path.to_string(),
    }
}

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.route = %normalized_path,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Some(m) = metrics() {
        m.record_http_request(
            method.as_str(),
            &normalized_path,
            status.as_u16(),
            duration.as_secs_f64(),
        );
    }

    // Raw path is not logged: it carries the scan code.
    tracing::info!(
        method = %method,
        path = %normalized_path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_scan_code() {
        assert_eq!(normalize_path("/scan/ABC123"), "/scan/{code}");
    }

    #[test]
    fn test_normalize_path_uuid_shaped_code() {
        let path = "/scan/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/scan/{code}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/scan"), "/scan");
        assert_eq!(normalize_path("/api/v1/resolve"), "/api/v1/resolve");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }
}
