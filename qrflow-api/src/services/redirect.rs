//! Redirect Policy
//!
//! Total mapping from a resolution result to exactly one [`Navigation`].
//! Precedence: session, then campaign fallback (only once a campaign record
//! was reached), then not-found.

use qrflow_core::{Campaign, Navigation, OutcomeCode, PreviewRejection, ResolvedSession, StoreError};

use super::lookup_chain::{ChainFailure, ResolvedCode};

/// Everything the scan path can hand to the policy.
#[derive(Debug)]
pub enum ScanResolution {
    /// No code parameter on the request
    MissingCode,
    /// Chain reached a campaign record
    Resolved(ResolvedCode),
    /// Chain stopped at a stage
    Failed(ChainFailure),
    /// Store faulted somewhere in the chain
    Fault(StoreError),
}

/// Decides the navigation outcome for both entry paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectPolicy;

impl RedirectPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn decide_scan(&self, resolution: ScanResolution) -> Navigation {
        match resolution {
            ScanResolution::MissingCode => Navigation::not_found(OutcomeCode::MissingCode),
            ScanResolution::Failed(failure) => Navigation::not_found(failure.code()),
            ScanResolution::Fault(e) => {
                tracing::error!(error = %e, "Scan resolution faulted");
                Navigation::not_found(OutcomeCode::ProcessingError)
            }
            ScanResolution::Resolved(resolved) => {
                if resolved.campaign.has_usable_id() {
                    return Navigation::Session {
                        session: ResolvedSession::from_scan(&resolved.campaign, resolved.scanned),
                    };
                }
                self.fallback_or_not_found(&resolved.campaign, OutcomeCode::NoCampaignData)
            }
        }
    }

    pub fn decide_preview(&self, result: Result<ResolvedSession, PreviewRejection>) -> Navigation {
        match result {
            Ok(session) => Navigation::Session { session },
            Err(rejection) => Navigation::not_found(rejection.code()),
        }
    }

    /// Campaign was reached but cannot be entered.
    fn fallback_or_not_found(&self, campaign: &Campaign, reason: OutcomeCode) -> Navigation {
        let Some(raw) = campaign.fallback_url() else {
            return Navigation::not_found(reason);
        };
        match navigable_url(raw) {
            Some(url) => Navigation::Fallback {
                url: url.as_str().to_string(),
                reason,
            },
            None => {
                tracing::warn!(
                    campaign_name = %campaign.name,
                    fallback_url = %raw.escape_debug(),
                    "Ignoring fallback URL that is not absolute http(s)"
                );
                Navigation::not_found(reason)
            }
        }
    }
}

/// Absolute `http`/`https` URL, in serialized form.
///
/// Serialization strips tabs and newlines and percent-encodes other control
/// characters, so the result is always a valid `Location` header value.
fn navigable_url(raw: &str) -> Option<reqwest::Url> {
    reqwest::Url::parse(raw)
        .ok()
        .filter(|parsed| matches!(parsed.scheme(), "http" | "https") && parsed.has_host())
}
