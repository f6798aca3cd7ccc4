//! Preview token payload and rejection reasons

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EpochSecs, OutcomeCode};

/// The only mode marker a preview token may carry.
pub const PREVIEW_MODE: &str = "test";

/// Payload segment of a preview token.
///
/// Only inspected structurally here; the signature is verified by the
/// trusted exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewClaims {
    /// Mode marker, must equal [`PREVIEW_MODE`]
    pub mode: String,
    #[serde(
        default,
        rename = "campaignId",
        alias = "campaign_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub campaign_id: Option<String>,
    #[serde(
        default,
        rename = "templateId",
        alias = "template_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub template_id: Option<String>,
    /// Issuer identity
    #[serde(alias = "issuer")]
    pub iss: String,
    /// Expiry, seconds since the epoch
    pub exp: EpochSecs,
}

impl PreviewClaims {
    pub fn is_test_mode(&self) -> bool {
        self.mode == PREVIEW_MODE
    }

    /// Strictly in the future relative to `now`.
    pub fn is_live_at(&self, now: EpochSecs) -> bool {
        self.exp > now
    }
}

/// Why a preview bootstrap ended in `rejected`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreviewRejection {
    #[error("Preview token missing")]
    MissingToken,

    #[error("Preview token malformed: {reason}")]
    MalformedToken { reason: String },

    #[error("Preview token expired at {exp} (now {now})")]
    ExpiredToken { exp: EpochSecs, now: EpochSecs },

    #[error("Preview token has mode '{mode}', expected '{}'", PREVIEW_MODE)]
    WrongMode { mode: String },

    #[error("Preview token exchange failed: {message}")]
    ExchangeFailed { message: String },
}

impl PreviewRejection {
    pub fn code(&self) -> OutcomeCode {
        match self {
            PreviewRejection::MissingToken => OutcomeCode::MissingToken,
            PreviewRejection::MalformedToken { .. } => OutcomeCode::MalformedToken,
            PreviewRejection::ExpiredToken { .. } => OutcomeCode::ExpiredToken,
            PreviewRejection::WrongMode { .. } => OutcomeCode::WrongMode,
            PreviewRejection::ExchangeFailed { .. } => OutcomeCode::ExchangeFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_accept_camel_and_snake_case() -> Result<(), serde_json::Error> {
        let camel: PreviewClaims = serde_json::from_str(
            r#"{"mode":"test","campaignId":"C9","templateId":"T1","iss":"admin-1","exp":10}"#,
        )?;
        let snake: PreviewClaims = serde_json::from_str(
            r#"{"mode":"test","campaign_id":"C9","template_id":"T1","issuer":"admin-1","exp":10}"#,
        )?;
        assert_eq!(camel, snake);
        assert_eq!(camel.campaign_id.as_deref(), Some("C9"));
        Ok(())
    }

    #[test]
    fn test_claims_require_expiry() {
        let result: Result<PreviewClaims, _> =
            serde_json::from_str(r#"{"mode":"test","iss":"admin-1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_expiry_is_strict() {
        let claims = PreviewClaims {
            mode: PREVIEW_MODE.to_string(),
            campaign_id: None,
            template_id: None,
            iss: "admin-1".to_string(),
            exp: 100,
        };
        assert!(claims.is_live_at(99));
        assert!(!claims.is_live_at(100));
        assert!(claims.is_test_mode());
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(PreviewRejection::MissingToken.code(), OutcomeCode::MissingToken);
        assert_eq!(
            PreviewRejection::WrongMode { mode: "live".to_string() }.code(),
            OutcomeCode::WrongMode
        );
        let msg = PreviewRejection::WrongMode { mode: "live".to_string() }.to_string();
        assert!(msg.contains("'live'"));
        assert!(msg.contains("'test'"));
    }
}
