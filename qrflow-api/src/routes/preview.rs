//! Preview REST API Routes
//!
//! Entry path for signed preview tokens. Same outcome contract as the scan
//! routes; the JSON variant also reports the bootstrap state trace.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use qrflow_core::{Navigation, OutcomeCode};
use serde::Serialize;

use super::scan::redirect_to;
use crate::extractors::ParamChannels;
use crate::services::BootstrapState;
use crate::state::AppState;

/// Query parameter carrying the preview token.
pub const TOKEN_PARAM: &str = "token";

/// Preview outcome as JSON.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PreviewResponse {
    pub navigation: Navigation,
    pub location: String,
    /// States the bootstrap passed through, empty if it timed out
    pub trace: Vec<BootstrapState>,
}

/// Run the preview pipeline, bounded by the resolve timeout.
async fn resolve_preview(state: &AppState, token: Option<&str>) -> (Navigation, Vec<BootstrapState>) {
    let timeout = state.config.resolve_timeout;
    match tokio::time::timeout(timeout, state.pipeline.resolve_preview(token)).await {
        Ok(outcome) => (outcome.navigation, outcome.run.trace),
        Err(_) => {
            tracing::error!(timeout_secs = timeout.as_secs(), "Preview bootstrap timed out");
            (Navigation::not_found(OutcomeCode::ExchangeFailed), Vec::new())
        }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// Bootstrap a preview session and redirect into it.
#[utoipa::path(
    get,
    path = "/preview",
    tag = "Preview",
    params(
        ("token" = Option<String>, Query, description = "Signed preview token"),
        ("X-Route-Fragment" = Option<String>, Header, description = "Client routing fragment"),
    ),
    responses(
        (status = 303, description = "Redirect to preview session or not-found page"),
    ),
)]
pub async fn preview(State(state): State<AppState>, channels: ParamChannels) -> impl IntoResponse {
    let token = channels.get(TOKEN_PARAM);
    let (navigation, _) = resolve_preview(&state, token.as_deref()).await;
    redirect_to(&state, &navigation)
}

/// Bootstrap a preview session and describe the outcome.
#[utoipa::path(
    get,
    path = "/api/v1/preview",
    tag = "Preview",
    params(
        ("token" = Option<String>, Query, description = "Signed preview token"),
        ("X-Route-Fragment" = Option<String>, Header, description = "Client routing fragment"),
    ),
    responses(
        (status = 200, description = "Preview outcome", body = PreviewResponse),
    ),
)]
pub async fn preview_json(State(state): State<AppState>, channels: ParamChannels) -> Json<PreviewResponse> {
    let token = channels.get(TOKEN_PARAM);
    let (navigation, trace) = resolve_preview(&state, token.as_deref()).await;
    let location = navigation.location(&state.config.flow_base_url, &state.config.not_found_url);
    Json(PreviewResponse {
        navigation,
        location,
        trace,
    })
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new().route("/preview", get(preview))
}

pub fn create_api_router() -> Router<AppState> {
    Router::new().route("/preview", get(preview_json))
}
