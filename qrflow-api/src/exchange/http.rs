//! Remote preview token exchange over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use qrflow_core::ExchangeError;
use serde::{Deserialize, Serialize};

use super::{ExchangeGrant, PreviewExchange};

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    token: &'a str,
}

/// Error body the exchange may answer with on rejection.
#[derive(Debug, Deserialize)]
struct ExchangeErrorBody {
    #[serde(alias = "message")]
    error: String,
}

/// Client for the trusted exchange endpoint.
///
/// POSTs `{"token": "..."}` and expects `{"sessionId", "campaignId"}`.
#[derive(Debug, Clone)]
pub struct HttpPreviewExchange {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    timeout: Duration,
}

impl HttpPreviewExchange {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ExchangeError> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| ExchangeError::Transport {
            reason: format!("invalid exchange endpoint {}: {}", endpoint, e),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::Transport {
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    fn map_send_error(&self, err: reqwest::Error) -> ExchangeError {
        if err.is_timeout() {
            ExchangeError::TimedOut {
                secs: self.timeout.as_secs(),
            }
        } else {
            ExchangeError::Transport {
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl PreviewExchange for HttpPreviewExchange {
    async fn exchange(&self, token: &str) -> Result<ExchangeGrant, ExchangeError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("User-Agent", "qrflow-preview/1.0")
            .json(&ExchangeRequest { token })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ExchangeErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| {
                    if body.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("no response body")
                            .to_string()
                    } else {
                        body.trim().to_string()
                    }
                });
            tracing::warn!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                message = %message,
                "Preview exchange rejected token"
            );
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let grant = response
            .json::<ExchangeGrant>()
            .await
            .map_err(|e| ExchangeError::InvalidResponse {
                reason: e.to_string(),
            })?;

        tracing::debug!(
            session_id = %grant.session_id,
            campaign_id = %grant.campaign_id,
            "Preview exchange granted session"
        );
        Ok(grant)
    }
}
