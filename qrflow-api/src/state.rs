//! Shared application state for Axum routers.

use std::sync::Arc;

use qrflow_storage::ScanStore;

use crate::config::ApiConfig;
use crate::services::ResolutionPipeline;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ResolutionPipeline,
    pub config: Arc<ApiConfig>,
    /// Same store the pipeline reads, kept for readiness probes.
    pub store: Arc<dyn ScanStore>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(pipeline: ResolutionPipeline, config: ApiConfig, store: Arc<dyn ScanStore>) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
            store,
            start_time: std::time::Instant::now(),
        }
    }
}

crate::impl_from_ref!(ResolutionPipeline, pipeline);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(Arc<dyn ScanStore>, store);
crate::impl_from_ref!(std::time::Instant, start_time);
