//! REST API Routes Module
//!
//! Assembles the scan, preview, health, metrics and OpenAPI routes into one
//! router with observability middleware and CORS.

pub mod health;
pub mod preview;
pub mod scan;

use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::{is_production_environment, ApiConfig};
use crate::error::ApiResult;
use crate::extractors::ROUTE_FRAGMENT_HEADER;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// CORS
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// Empty origin list allows all origins; otherwise origins are matched with
/// [`ApiConfig::is_origin_allowed`], which understands `*.domain` entries.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(ROUTE_FRAGMENT_HEADER),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: restricting origins");
        let config = config.clone();
        cors.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| config.is_origin_allowed(origin))
                .unwrap_or(false)
        }))
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete router.
///
/// - `/scan`, `/scan/:code`, `/preview`: 303 redirects
/// - `/api/v1/resolve`, `/api/v1/preview`: JSON outcomes
/// - `/health/*`, `/metrics`, `/openapi.json`
///
/// # Errors
/// In production, refuses to build when the API config is unsafe.
pub fn create_api_router(state: AppState) -> ApiResult<Router> {
    state.config.validate()?;
    if is_production_environment() {
        state.config.validate_for_production()?;
    }

    let api_routes = Router::new()
        .merge(scan::create_api_router())
        .merge(preview::create_api_router());

    let router = Router::new()
        .merge(scan::create_router())
        .merge(preview::create_router())
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler));

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", get(openapi_json));

    let cors = build_cors_layer(&state.config);

    Ok(router
        .with_state(state)
        .layer(from_fn(observability_middleware))
        .layer(cors))
}
