//! Scan REST API Routes
//!
//! Browser-facing redirects for printed codes plus a JSON variant for
//! single-page callers. Both run the same pipeline under the configured
//! caller-side timeout.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Redirect},
    routing::get,
    Json, Router,
};
use qrflow_core::{session::param, Navigation, OutcomeCode};
use serde::{Deserialize, Serialize};

use crate::extractors::ParamChannels;
use crate::state::AppState;

/// Navigation outcome as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResolutionResponse {
    pub navigation: Navigation,
    /// Absolute URL the caller should navigate to
    pub location: String,
}

impl ResolutionResponse {
    pub fn new(state: &AppState, navigation: Navigation) -> Self {
        let location = navigation.location(&state.config.flow_base_url, &state.config.not_found_url);
        Self { navigation, location }
    }
}

/// 303 to the outcome's location, never cached.
pub(crate) fn redirect_to(state: &AppState, navigation: &Navigation) -> impl IntoResponse {
    let location = navigation.location(&state.config.flow_base_url, &state.config.not_found_url);
    ([(header::CACHE_CONTROL, "no-store")], Redirect::to(&location))
}

/// Run the scan pipeline, bounded by the resolve timeout.
///
/// The increment is left running on its own task.
async fn resolve_scan(state: &AppState, code: Option<&str>) -> Navigation {
    let timeout = state.config.resolve_timeout;
    match tokio::time::timeout(timeout, state.pipeline.resolve_scan(code)).await {
        Ok(outcome) => outcome.navigation,
        Err(_) => {
            tracing::error!(timeout_secs = timeout.as_secs(), "Scan resolution timed out");
            Navigation::not_found(OutcomeCode::ProcessingError)
        }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// Resolve a scan from the `qr` parameter (query string or route fragment).
#[utoipa::path(
    get,
    path = "/scan",
    tag = "Scan",
    params(
        ("qr" = Option<String>, Query, description = "Scanned code"),
        ("X-Route-Fragment" = Option<String>, Header, description = "Client routing fragment, e.g. #/scan?qr=ABC123"),
    ),
    responses(
        (status = 303, description = "Redirect to session, fallback or not-found page"),
    ),
)]
pub async fn scan_by_query(State(state): State<AppState>, channels: ParamChannels) -> impl IntoResponse {
    let code = channels.get(param::SCAN_CODE);
    let navigation = resolve_scan(&state, code.as_deref()).await;
    redirect_to(&state, &navigation)
}

/// Resolve a scan from the path.
#[utoipa::path(
    get,
    path = "/scan/{code}",
    tag = "Scan",
    params(
        ("code" = String, Path, description = "Scanned code"),
    ),
    responses(
        (status = 303, description = "Redirect to session, fallback or not-found page"),
    ),
)]
pub async fn scan_by_path(State(state): State<AppState>, Path(code): Path<String>) -> impl IntoResponse {
    let navigation = resolve_scan(&state, Some(&code)).await;
    redirect_to(&state, &navigation)
}

/// Resolve a scan and describe the outcome instead of redirecting.
#[utoipa::path(
    get,
    path = "/api/v1/resolve",
    tag = "Scan",
    params(
        ("qr" = Option<String>, Query, description = "Scanned code"),
        ("X-Route-Fragment" = Option<String>, Header, description = "Client routing fragment"),
    ),
    responses(
        (status = 200, description = "Navigation outcome", body = ResolutionResponse),
    ),
)]
pub async fn resolve(State(state): State<AppState>, channels: ParamChannels) -> Json<ResolutionResponse> {
    let code = channels.get(param::SCAN_CODE);
    let navigation = resolve_scan(&state, code.as_deref()).await;
    Json(ResolutionResponse::new(&state, navigation))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Browser-facing scan routes, mounted at the root.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/scan", get(scan_by_query))
        .route("/scan/:code", get(scan_by_path))
}

/// JSON routes, mounted under /api/v1.
pub fn create_api_router() -> Router<AppState> {
    Router::new().route("/resolve", get(resolve))
}
