#![allow(dead_code)]
//! Router and pipeline wiring over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use qrflow_api::{create_api_router, ApiConfig, ApiResult, AppState, FixedClock, PreviewExchange, ResolutionPipeline};
use qrflow_test_utils::fixtures::{FLOW_BASE_URL, NOT_FOUND_URL, NOW};
use qrflow_test_utils::MockScanStore;

pub fn test_config() -> ApiConfig {
    ApiConfig {
        flow_base_url: FLOW_BASE_URL.to_string(),
        not_found_url: NOT_FOUND_URL.to_string(),
        resolve_timeout: Duration::from_secs(2),
        ..ApiConfig::default()
    }
}

/// Pipeline over a clone of `store`, with the clock fixed at `NOW`.
pub fn test_pipeline(store: &MockScanStore, exchange: impl PreviewExchange + 'static) -> ResolutionPipeline {
    ResolutionPipeline::new(Arc::new(store.clone()), Arc::new(exchange), Arc::new(FixedClock(NOW)))
}

pub fn test_state(
    store: &MockScanStore,
    exchange: impl PreviewExchange + 'static,
    config: ApiConfig,
) -> AppState {
    AppState::new(test_pipeline(store, exchange), config, Arc::new(store.clone()))
}

pub fn test_router(store: &MockScanStore, exchange: impl PreviewExchange + 'static) -> ApiResult<Router> {
    create_api_router(test_state(store, exchange, test_config()))
}
