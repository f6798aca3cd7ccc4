//! Preview Token Exchange
//!
//! The exchange is a trusted collaborator: it verifies the token signature,
//! provisions a preview session and answers with the session and campaign
//! identifiers. Two implementations exist:
//! - [`HttpPreviewExchange`] calls the remote exchange endpoint
//! - [`LocalPreviewExchange`] verifies in-process for local development

pub mod http;
pub mod local;

pub use http::HttpPreviewExchange;
pub use local::{LocalPreviewExchange, PreviewSecret};

use std::sync::Arc;

use async_trait::async_trait;
use qrflow_core::{ConfigError, ExchangeError, QrflowError};
use serde::{Deserialize, Serialize};

use crate::config::{ExchangeConfig, ExchangeMode};

/// What the exchange hands back for an accepted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeGrant {
    pub session_id: String,
    pub campaign_id: String,
}

/// Exchange a preview token for a live session.
#[async_trait]
pub trait PreviewExchange: Send + Sync {
    async fn exchange(&self, token: &str) -> Result<ExchangeGrant, ExchangeError>;
}

/// Build the exchange selected by `config`.
///
/// # Errors
/// Returns error if the config is incomplete for its mode or the HTTP client
/// cannot be built.
pub fn from_config(config: &ExchangeConfig) -> Result<Arc<dyn PreviewExchange>, QrflowError> {
    config.validate()?;
    match config.mode {
        ExchangeMode::Http => {
            let url = config.url.as_deref().ok_or_else(|| ConfigError::MissingRequired {
                field: "QRFLOW_EXCHANGE_URL".to_string(),
            })?;
            let exchange = HttpPreviewExchange::new(url, config.timeout)?;
            tracing::info!(endpoint = %exchange.endpoint(), "Using remote preview exchange");
            Ok(Arc::new(exchange))
        }
        ExchangeMode::Local => {
            let secret = config.preview_secret.clone().ok_or_else(|| ConfigError::MissingRequired {
                field: "QRFLOW_PREVIEW_SECRET".to_string(),
            })?;
            tracing::warn!("Using in-process preview exchange; not for production");
            Ok(Arc::new(LocalPreviewExchange::new(secret)))
        }
    }
}
