//! OpenAPI Specification for the qrflow API
//!
//! Generated with utoipa from the route annotations and schema derives.

use utoipa::OpenApi;

use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::preview::PreviewResponse;
use crate::routes::scan::ResolutionResponse;
use crate::routes::{health, preview, scan};
use crate::services::BootstrapState;
use crate::telemetry::metrics;

use qrflow_core::{Navigation, OutcomeCode, ResolvedSession};

/// OpenAPI document for the qrflow API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "qrflow API",
        version = "0.1.0",
        description = "Resolves scanned QR codes and preview tokens to flow sessions",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Scan", description = "Scanned code resolution"),
        (name = "Preview", description = "Preview session bootstrap"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        scan::scan_by_query,
        scan::scan_by_path,
        scan::resolve,
        preview::preview,
        preview::preview_json,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            Navigation, OutcomeCode, ResolvedSession,
            ResolutionResponse, PreviewResponse, BootstrapState,
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth,
        )
    )
)]
pub struct ApiDoc;
