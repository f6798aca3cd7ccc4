//! qrflow API Server Entry Point
//!
//! Loads configuration, wires the resolution pipeline to PostgreSQL and the
//! preview exchange, and serves the Axum router until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use qrflow_api::telemetry::{init_tracing, TelemetryConfig};
use qrflow_api::{
    create_api_router, exchange, is_production_environment, ApiConfig, ApiError, ApiResult, AppState,
    DbConfig, ExchangeConfig, PgScanStore, ResolutionPipeline, SystemClock,
};
use qrflow_storage::ScanStore;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let exchange_config = ExchangeConfig::from_env()?;
    if is_production_environment() {
        exchange_config.validate_for_production()?;
    }

    let db_config = DbConfig::from_env();
    let store: Arc<dyn ScanStore> = Arc::new(PgScanStore::from_config(&db_config)?);
    if let Err(e) = store.health_check().await {
        // Readiness reports this; the pool reconnects on demand.
        tracing::warn!(error = %e, host = %db_config.host, "Store not reachable at startup");
    }

    let exchange = exchange::from_config(&exchange_config)?;
    let pipeline = ResolutionPipeline::new(Arc::clone(&store), exchange, Arc::new(SystemClock));
    let app = create_api_router(AppState::new(pipeline, api_config, store))?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting qrflow API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("QRFLOW_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("QRFLOW_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
