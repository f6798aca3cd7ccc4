//! Test/Preview Session Bootstrap
//!
//! `pending -> validating -> exchanging -> ready`, or `rejected` from
//! `validating` or `exchanging`. Local validation is structural only; the
//! signature belongs to the trusted exchange. No retries.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use qrflow_core::{EpochSecs, PreviewClaims, PreviewRejection, ResolvedSession};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::exchange::PreviewExchange;

/// Bootstrap state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    Pending,
    Validating,
    Exchanging,
    Ready,
    Rejected,
}

impl BootstrapState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootstrapState::Ready | BootstrapState::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapState::Pending => "pending",
            BootstrapState::Validating => "validating",
            BootstrapState::Exchanging => "exchanging",
            BootstrapState::Ready => "ready",
            BootstrapState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bootstrap attempt: the states it passed through and its result.
#[derive(Debug, Clone)]
pub struct BootstrapRun {
    pub trace: Vec<BootstrapState>,
    pub result: Result<ResolvedSession, PreviewRejection>,
}

impl BootstrapRun {
    pub fn final_state(&self) -> BootstrapState {
        self.trace.last().copied().unwrap_or(BootstrapState::Pending)
    }
}

/// Structural checks on a preview token, in rejection order:
/// missing, shape, payload decode, expiry, mode.
///
/// Never decodes the payload of a token that is not three segments.
pub fn inspect_token(token: Option<&str>, now: EpochSecs) -> Result<PreviewClaims, PreviewRejection> {
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(PreviewRejection::MissingToken),
    };

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(PreviewRejection::MalformedToken {
            reason: format!("expected 3 segments, found {}", segments.len()),
        });
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|e| PreviewRejection::MalformedToken {
            reason: format!("payload is not base64url: {}", e),
        })?;

    let claims: PreviewClaims =
        serde_json::from_slice(&payload).map_err(|e| PreviewRejection::MalformedToken {
            reason: format!("payload is not a preview claim set: {}", e),
        })?;

    if !claims.is_live_at(now) {
        return Err(PreviewRejection::ExpiredToken { exp: claims.exp, now });
    }

    if !claims.is_test_mode() {
        return Err(PreviewRejection::WrongMode { mode: claims.mode });
    }

    Ok(claims)
}

/// Drives one preview token through validation and exchange.
#[derive(Clone)]
pub struct PreviewBootstrap {
    exchange: Arc<dyn PreviewExchange>,
    clock: Arc<dyn Clock>,
}

impl PreviewBootstrap {
    pub fn new(exchange: Arc<dyn PreviewExchange>, clock: Arc<dyn Clock>) -> Self {
        Self { exchange, clock }
    }

    pub async fn run(&self, token: Option<&str>) -> BootstrapRun {
        let mut trace = vec![BootstrapState::Pending, BootstrapState::Validating];

        let claims = match inspect_token(token, self.clock.now_epoch_secs()) {
            Ok(claims) => claims,
            Err(rejection) => return Self::reject(trace, rejection),
        };

        trace.push(BootstrapState::Exchanging);
        // inspect_token only succeeds for a present token.
        let token = token.map(str::trim).unwrap_or_default();

        let grant = match self.exchange.exchange(token).await {
            Ok(grant) => grant,
            Err(e) => {
                return Self::reject(
                    trace,
                    PreviewRejection::ExchangeFailed {
                        message: format!("preview exchange: {}", e),
                    },
                )
            }
        };

        if grant.session_id.trim().is_empty() || grant.campaign_id.trim().is_empty() {
            return Self::reject(
                trace,
                PreviewRejection::ExchangeFailed {
                    message: "preview exchange: grant is missing session or campaign id".to_string(),
                },
            );
        }

        if let Some(requested) = claims.campaign_id.as_deref() {
            if requested != grant.campaign_id {
                tracing::info!(
                    requested_campaign = %requested,
                    granted_campaign = %grant.campaign_id,
                    "Exchange granted a different campaign than the token names"
                );
            }
        }

        trace.push(BootstrapState::Ready);
        tracing::info!(
            campaign_id = %grant.campaign_id,
            template_id = ?claims.template_id,
            "Preview session ready"
        );

        BootstrapRun {
            trace,
            result: Ok(ResolvedSession::from_preview(grant.campaign_id, grant.session_id)),
        }
    }

    fn reject(mut trace: Vec<BootstrapState>, rejection: PreviewRejection) -> BootstrapRun {
        let from = trace.last().copied().unwrap_or(BootstrapState::Pending);
        trace.push(BootstrapState::Rejected);
        tracing::info!(from = %from, code = %rejection.code(), reason = %rejection, "Preview bootstrap rejected");
        BootstrapRun {
            trace,
            result: Err(rejection),
        }
    }
}
