//! qrflow API - Scan Resolution Pipeline and HTTP Surface
//!
//! Resolves a scanned QR code through code -> batch -> campaign lookups, or
//! a preview token through the trusted exchange, into exactly one navigation
//! outcome: a flow session URL, a campaign fallback URL, or a not-found page
//! carrying an error code. Served over Axum with health, metrics and OpenAPI
//! endpoints.

pub mod macros;

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod exchange;
pub mod extractors;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{is_production_environment, ApiConfig, ExchangeConfig, ExchangeMode};
pub use db::{DbConfig, PgScanStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use exchange::{ExchangeGrant, HttpPreviewExchange, LocalPreviewExchange, PreviewExchange, PreviewSecret};
pub use extractors::ParamChannels;
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::{
    BootstrapRun, BootstrapState, ChainFailure, CodeLookupChain, PendingIncrement, PreviewBootstrap,
    PreviewOutcome, RedirectPolicy, ResolutionPipeline, ResolvedCode, ScanAccounting, ScanOutcome,
    ScanResolution,
};
pub use state::AppState;
