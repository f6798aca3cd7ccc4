//! qrflow Core - Entity Types
//!
//! Request-scoped copies of the records the scan resolution pipeline reads,
//! plus the pieces every other crate shares: outcome codes, the parameter
//! resolver and the session-entry URL contract. Nothing in here performs I/O.

pub mod error;
pub mod outcome;
pub mod params;
pub mod preview;
pub mod session;

pub use error::{ConfigError, ExchangeError, QrflowError, StoreError};
pub use outcome::{Navigation, OutcomeCode};
pub use params::{resolve_params, ResolvedParams, FRAGMENT_QUERY_DELIMITER};
pub use preview::{PreviewClaims, PreviewRejection, PREVIEW_MODE};
pub use session::ResolvedSession;

use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Seconds since the Unix epoch, as carried in token payloads.
pub type EpochSecs = i64;

// ============================================================================
// RECORDS
// ============================================================================

/// A printed QR code as returned by the store.
///
/// `scan_count` is the value the store held when the record was read; the
/// pipeline never writes it back, it only asks the store to add one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScanCode {
    /// Opaque code embedded in the printed QR image
    pub id: String,
    /// Batch the code was printed in
    pub grouping_ref: String,
    /// Number of recorded lookups
    pub scan_count: i64,
}

/// A print batch. Every code belongs to exactly one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Grouping {
    pub id: String,
    /// Campaign that owns the batch
    pub campaign_ref: String,
}

/// Campaign a scanning customer is routed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Campaign {
    pub id: String,
    pub name: String,
    /// Customer-facing access credential forwarded to the flow runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_credential: Option<String>,
    /// Destination used when the flow cannot be entered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,
}

impl Campaign {
    /// Whether the record carries an identifier a session can be built from.
    pub fn has_usable_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Configured fallback URL, ignoring blank values.
    pub fn fallback_url(&self) -> Option<&str> {
        self.fallback_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Access credential, ignoring blank values.
    pub fn access_credential(&self) -> Option<&str> {
        self.access_credential
            .as_deref()
            .filter(|credential| !credential.is_empty())
    }
}

/// Stage of the code -> batch -> campaign lookup chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum LookupStage {
    Code,
    Grouping,
    Campaign,
}

impl LookupStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStage::Code => "code",
            LookupStage::Grouping => "grouping",
            LookupStage::Campaign => "campaign",
        }
    }
}

impl std::fmt::Display for LookupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(fallback: Option<&str>) -> Campaign {
        Campaign {
            id: "C1".to_string(),
            name: "Spring launch".to_string(),
            access_credential: None,
            fallback_url: fallback.map(str::to_string),
        }
    }

    #[test]
    fn test_blank_fallback_is_absent() {
        assert_eq!(campaign(Some("   ")).fallback_url(), None);
        assert_eq!(campaign(None).fallback_url(), None);
        assert_eq!(
            campaign(Some(" https://brand.example/help ")).fallback_url(),
            Some("https://brand.example/help")
        );
    }

    #[test]
    fn test_blank_campaign_id_is_unusable() {
        let mut c = campaign(None);
        assert!(c.has_usable_id());
        c.id = "  ".to_string();
        assert!(!c.has_usable_id());
    }

    #[test]
    fn test_campaign_deserializes_without_optionals() -> Result<(), serde_json::Error> {
        let c: Campaign = serde_json::from_str(r#"{"id":"C1","name":"Launch"}"#)?;
        assert_eq!(c.access_credential, None);
        assert_eq!(c.fallback_url, None);
        Ok(())
    }

    #[test]
    fn test_lookup_stage_display() {
        assert_eq!(LookupStage::Code.to_string(), "code");
        assert_eq!(LookupStage::Campaign.to_string(), "campaign");
    }
}
