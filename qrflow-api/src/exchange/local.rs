//! In-process preview token exchange for local development.
//!
//! Verifies the HS256 signature with the shared preview secret and
//! provisions a UUIDv7 session id. Production deployments delegate to the
//! remote exchange instead.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use qrflow_core::{ConfigError, ExchangeError, PreviewClaims};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use super::{ExchangeGrant, PreviewExchange};
use crate::clock::{Clock, SystemClock};

// ============================================================================
// PREVIEW SECRET (TYPE-SAFE)
// ============================================================================

/// Shared signing secret for preview tokens that never prints itself.
#[derive(Clone)]
pub struct PreviewSecret(SecretString);

impl PreviewSecret {
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "preview_secret".to_string(),
            });
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for PreviewSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PreviewSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// LOCAL EXCHANGE
// ============================================================================

/// Exchange that trusts tokens signed with the shared secret.
#[derive(Clone)]
pub struct LocalPreviewExchange {
    secret: PreviewSecret,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LocalPreviewExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPreviewExchange")
            .field("secret", &self.secret)
            .field("clock", &"<Clock>")
            .finish()
    }
}

impl LocalPreviewExchange {
    pub fn new(secret: PreviewSecret) -> Self {
        Self {
            secret,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn rejected(status: u16, message: impl Into<String>) -> ExchangeError {
        ExchangeError::Rejected {
            status,
            message: message.into(),
        }
    }
}

#[async_trait]
impl PreviewExchange for LocalPreviewExchange {
    async fn exchange(&self, token: &str) -> Result<ExchangeGrant, ExchangeError> {
        let key = DecodingKey::from_secret(self.secret.expose().as_bytes());

        // Signature only; time is checked against our own clock below.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let claims = decode::<PreviewClaims>(token, &key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    Self::rejected(401, "token signature is invalid")
                }
                _ => Self::rejected(401, format!("token verification failed: {}", e)),
            })?
            .claims;

        let now = self.clock.now_epoch_secs();
        if !claims.is_live_at(now) {
            return Err(Self::rejected(401, "token has expired"));
        }
        if !claims.is_test_mode() {
            return Err(Self::rejected(403, "token is not a preview token"));
        }

        let campaign_id = claims
            .campaign_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Self::rejected(400, "token carries no campaign"))?;

        let session_id = Uuid::now_v7().to_string();
        tracing::info!(
            issuer = %claims.iss,
            campaign_id = %campaign_id,
            session_id = %session_id,
            "Provisioned local preview session"
        );

        Ok(ExchangeGrant {
            session_id,
            campaign_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use qrflow_core::PREVIEW_MODE;

    const NOW: i64 = 1704067200;

    fn secret() -> PreviewSecret {
        PreviewSecret::new("local-preview-secret".to_string()).expect("valid test secret")
    }

    fn exchange() -> LocalPreviewExchange {
        LocalPreviewExchange::new(secret()).with_clock(Arc::new(FixedClock(NOW)))
    }

    fn claims(mode: &str, campaign: Option<&str>, exp: i64) -> PreviewClaims {
        PreviewClaims {
            mode: mode.to_string(),
            campaign_id: campaign.map(str::to_string),
            template_id: None,
            iss: "admin-1".to_string(),
            exp,
        }
    }

    fn sign(claims: &PreviewClaims, key: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .expect("token encodes")
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let debug = format!("{:?}", secret());
        assert!(!debug.contains("local-preview-secret"));
        assert!(debug.contains("REDACTED"));
        assert!(PreviewSecret::new("  ".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_valid_token_is_granted() -> Result<(), ExchangeError> {
        let token = sign(
            &claims(PREVIEW_MODE, Some("C9"), NOW + 3600),
            "local-preview-secret",
        );
        let grant = exchange().exchange(&token).await?;
        assert_eq!(grant.campaign_id, "C9");
        assert!(Uuid::parse_str(&grant.session_id).is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_signature_is_rejected() {
        let token = sign(&claims(PREVIEW_MODE, Some("C9"), NOW + 3600), "another-secret");
        let result = exchange().exchange(&token).await;
        assert!(matches!(result, Err(ExchangeError::Rejected { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let token = sign(&claims(PREVIEW_MODE, Some("C9"), NOW - 1), "local-preview-secret");
        let result = exchange().exchange(&token).await;
        assert!(matches!(result, Err(ExchangeError::Rejected { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_token_without_campaign_is_rejected() {
        let token = sign(&claims(PREVIEW_MODE, None, NOW + 60), "local-preview-secret");
        let result = exchange().exchange(&token).await;
        assert!(matches!(result, Err(ExchangeError::Rejected { status: 400, .. })));
    }
}
