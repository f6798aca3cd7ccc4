//! Prometheus Metrics Definitions
//!
//! Defines all qrflow metrics with their labels. Exposed on /metrics for
//! Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance, registered once on first use.
pub static METRICS: Lazy<ApiResult<QrflowMetrics>> = Lazy::new(QrflowMetrics::new);

/// Registered metrics, or `None` if registration failed at startup.
///
/// Recording is observability only; a registry failure is logged once by
/// the caller that first sees it and never fails a request.
pub fn metrics() -> Option<&'static QrflowMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all qrflow metrics.
#[derive(Clone)]
pub struct QrflowMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Navigation outcomes - labels: path (scan/preview), outcome
    pub resolutions_total: CounterVec,

    /// Scan counter increments - labels: status (success/failure)
    pub scan_increments_total: CounterVec,

    /// Preview bootstraps - labels: outcome (ready or rejection code)
    pub preview_bootstraps_total: CounterVec,
}

impl QrflowMetrics {
    /// Create and register all metrics with the default registry.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "qrflow_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "qrflow_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e))
            })?,

            resolutions_total: register_counter_vec!(
                "qrflow_resolutions_total",
                "Navigation outcomes produced by the resolution pipeline",
                &["path", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register resolutions_total: {}", e)))?,

            scan_increments_total: register_counter_vec!(
                "qrflow_scan_increments_total",
                "Scan counter increments issued to the store",
                &["status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register scan_increments_total: {}", e)))?,

            preview_bootstraps_total: register_counter_vec!(
                "qrflow_preview_bootstraps_total",
                "Preview session bootstraps by terminal state",
                &["outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register preview_bootstraps_total: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a navigation outcome. `outcome` is `session` or an outcome code.
    pub fn record_resolution(&self, path: &str, outcome: &str) {
        self.resolutions_total.with_label_values(&[path, outcome]).inc();
    }

    /// Record a scan counter increment.
    pub fn record_scan_increment(&self, success: bool) {
        let status = if success { "success" } else { "failure" };
        self.scan_increments_total.with_label_values(&[status]).inc();
    }

    /// Record the terminal state of a preview bootstrap.
    pub fn record_preview_bootstrap(&self, outcome: &str) {
        self.preview_bootstraps_total.with_label_values(&[outcome]).inc();
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Force registration so the families exist before the first scan.
    if let Err(e) = METRICS.as_ref() {
        tracing::error!(error = %e.message, "Metrics registry unavailable");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        assert!(!metrics.resolutions_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_resolution_counts_by_outcome() -> Result<(), String> {
        let metrics = metrics().ok_or("metrics unavailable")?;
        let before = metrics
            .resolutions_total
            .with_label_values(&["scan", "grouping-not-found"])
            .get();
        metrics.record_resolution("scan", "grouping-not-found");
        let after = metrics
            .resolutions_total
            .with_label_values(&["scan", "grouping-not-found"])
            .get();
        assert!(after >= before + 1.0);
        Ok(())
    }

    #[test]
    fn test_record_http_and_side_effects() -> Result<(), String> {
        let metrics = metrics().ok_or("metrics unavailable")?;
        metrics.record_http_request("GET", "/scan/{code}", 303, 0.004);
        metrics.record_scan_increment(true);
        metrics.record_scan_increment(false);
        metrics.record_preview_bootstrap("ready");
        Ok(())
    }
}
