//! qrflow Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Fixtures for the standard scan scenarios
//! - Preview token minting (unsigned and HS256-signed)
//! - Proptest generators for codes and parameter channels
//! - Assertions on navigation outcomes

// Re-export mock storage from its source crate
pub use qrflow_storage::MockScanStore;

// Re-export core types for convenience
pub use qrflow_core::{
    Campaign, EpochSecs, Grouping, LookupStage, Navigation, OutcomeCode, PreviewClaims,
    ResolvedSession, ScanCode, StoreError, PREVIEW_MODE,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built stores and records for the common scan scenarios.

    use super::*;

    /// Code, batch and campaign of the happy-path scenario.
    pub const CODE: &str = "ABC123";
    pub const GROUPING: &str = "B1";
    pub const CAMPAIGN: &str = "C1";

    /// Flow runtime and not-found page used by test configs.
    pub const FLOW_BASE_URL: &str = "https://app.qrflow.test/flow";
    pub const NOT_FOUND_URL: &str = "https://app.qrflow.test/not-found";

    /// Fixed "now" for token expiry checks: 2024-01-01T00:00:00Z.
    pub const NOW: EpochSecs = 1_704_067_200;

    /// Campaign with no credential and no fallback.
    pub fn campaign(id: &str) -> Campaign {
        Campaign {
            id: id.to_string(),
            name: format!("Campaign {}", id),
            access_credential: None,
            fallback_url: None,
        }
    }

    /// Campaign carrying a fallback URL.
    pub fn campaign_with_fallback(id: &str, fallback_url: &str) -> Campaign {
        Campaign {
            fallback_url: Some(fallback_url.to_string()),
            ..campaign(id)
        }
    }

    /// ABC123 -> B1 -> C1, fully resolvable.
    pub fn seeded_store() -> MockScanStore {
        MockScanStore::new()
            .with_code(CODE, GROUPING)
            .with_grouping(GROUPING, CAMPAIGN)
            .with_campaign(campaign(CAMPAIGN))
    }

    /// ABC123 -> B1, but B1 does not exist.
    pub fn store_missing_grouping() -> MockScanStore {
        MockScanStore::new().with_code(CODE, GROUPING)
    }

    /// ABC123 -> B1 -> C1, but C1 does not exist.
    pub fn store_missing_campaign() -> MockScanStore {
        MockScanStore::new()
            .with_code(CODE, GROUPING)
            .with_grouping(GROUPING, CAMPAIGN)
    }

    /// ABC123 -> B1 -> C1, where the C1 record has a blank id.
    pub fn store_blank_campaign(fallback_url: Option<&str>) -> MockScanStore {
        let record = Campaign {
            id: String::new(),
            name: "Unpublished".to_string(),
            access_credential: None,
            fallback_url: fallback_url.map(str::to_string),
        };
        MockScanStore::new()
            .with_code(CODE, GROUPING)
            .with_grouping(GROUPING, CAMPAIGN)
            .with_campaign_at(CAMPAIGN, record)
    }
}

// ============================================================================
// PREVIEW TOKENS
// ============================================================================

pub mod tokens {
    //! Preview token builders.

    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    /// Shared secret used by signed test tokens.
    pub const TEST_SECRET: &str = "qrflow-test-preview-secret-0123456789";

    /// Claims in preview mode for `campaign`, expiring at `exp`.
    pub fn claims(campaign: Option<&str>, exp: EpochSecs) -> PreviewClaims {
        PreviewClaims {
            mode: PREVIEW_MODE.to_string(),
            campaign_id: campaign.map(str::to_string),
            template_id: None,
            iss: "admin-1".to_string(),
            exp,
        }
    }

    /// Same claims with a different mode marker.
    pub fn claims_with_mode(mode: &str, campaign: Option<&str>, exp: EpochSecs) -> PreviewClaims {
        PreviewClaims {
            mode: mode.to_string(),
            ..claims(campaign, exp)
        }
    }

    /// Three-segment token with a placeholder signature.
    ///
    /// Enough for local structural checks; a verifying exchange rejects it.
    pub fn unsigned(claims: &PreviewClaims) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = match serde_json::to_vec(claims) {
            Ok(bytes) => URL_SAFE_NO_PAD.encode(bytes),
            Err(e) => panic!("claims serialize: {}", e),
        };
        format!("{}.{}.{}", header, payload, URL_SAFE_NO_PAD.encode("signature"))
    }

    /// Token with a raw, possibly invalid, payload segment.
    pub fn with_raw_payload(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.c2ln", URL_SAFE_NO_PAD.encode(payload))
    }

    /// HS256-signed token.
    pub fn signed(claims: &PreviewClaims, secret: &str) -> String {
        match encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        ) {
            Ok(token) => token,
            Err(e) => panic!("token encode: {}", e),
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for scan inputs.

    use proptest::prelude::*;

    /// Printable scan code, never blank.
    pub fn arb_code() -> impl Strategy<Value = String> {
        "[A-Z0-9]{4,12}"
    }

    /// Parameter value that survives form-encoding unchanged.
    pub fn arb_param_value() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-]{1,16}"
    }

    /// Parameter name distinct from the reserved delimiters.
    pub fn arb_param_name() -> impl Strategy<Value = String> {
        "[a-z]{1,8}"
    }

    /// Token made of `n` dot-separated segments where `n != 3`.
    pub fn arb_wrong_segment_token() -> impl Strategy<Value = String> {
        prop_oneof![1usize..3, 4usize..7].prop_flat_map(|n| {
            proptest::collection::vec("[A-Za-z0-9_-]{1,12}", n).prop_map(|parts| parts.join("."))
        })
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on navigation outcomes.

    use super::*;

    /// Assert a not-found outcome with `code`.
    #[track_caller]
    pub fn assert_not_found(navigation: &Navigation, code: OutcomeCode) {
        match navigation {
            Navigation::NotFound { code: got } => assert_eq!(*got, code, "wrong not-found code"),
            other => panic!("Expected NotFound({}), got: {:?}", code, other),
        }
    }

    /// Assert a session outcome and return it.
    #[track_caller]
    pub fn assert_session(navigation: &Navigation) -> &ResolvedSession {
        match navigation {
            Navigation::Session { session } => session,
            other => panic!("Expected Session, got: {:?}", other),
        }
    }

    /// Assert a fallback outcome pointing at `url`.
    #[track_caller]
    pub fn assert_fallback(navigation: &Navigation, url: &str) {
        match navigation {
            Navigation::Fallback { url: got, .. } => assert_eq!(got, url, "wrong fallback url"),
            other => panic!("Expected Fallback({}), got: {:?}", url, other),
        }
    }
}
