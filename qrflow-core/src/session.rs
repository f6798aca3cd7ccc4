//! Session-entry URL contract consumed by the flow runtime

use serde::{Deserialize, Serialize};

use crate::Campaign;

/// Query parameter names recognized by the flow runtime.
pub mod param {
    pub const CAMPAIGN: &str = "cid";
    pub const CREDENTIAL: &str = "ct";
    pub const SCAN_CODE: &str = "qr";
    pub const SESSION: &str = "session";
    pub const TEST: &str = "test";
}

/// A resolved flow session, handed to the navigation boundary as a URL.
///
/// Scan sessions carry the originating code; preview sessions carry an
/// explicit session id and the test flag. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResolvedSession {
    pub campaign_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_credential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub test: bool,
}

impl ResolvedSession {
    /// Session for a scanned code that resolved all the way to its campaign.
    pub fn from_scan(campaign: &Campaign, code: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign.id.clone(),
            access_credential: campaign.access_credential().map(str::to_string),
            scan_code: Some(code.into()),
            session_id: None,
            test: false,
        }
    }

    /// Session provisioned by the preview token exchange.
    pub fn from_preview(campaign_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            access_credential: None,
            scan_code: None,
            session_id: Some(session_id.into()),
            test: true,
        }
    }

    /// Parameters in the order the flow runtime documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(param::CAMPAIGN, self.campaign_id.clone())];
        if let Some(credential) = &self.access_credential {
            pairs.push((param::CREDENTIAL, credential.clone()));
        }
        if let Some(code) = &self.scan_code {
            pairs.push((param::SCAN_CODE, code.clone()));
        }
        if let Some(session_id) = &self.session_id {
            pairs.push((param::SESSION, session_id.clone()));
        }
        if self.test {
            pairs.push((param::TEST, "true".to_string()));
        }
        pairs
    }

    /// Encoded query string, e.g. `cid=C1&qr=ABC123`.
    pub fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Session-entry URL under the flow runtime's base URL.
    pub fn entry_url(&self, flow_base_url: &str) -> String {
        append_query(flow_base_url, &self.query_string())
    }
}

/// Append an encoded query to a base URL that may already carry one.
pub(crate) fn append_query(base: &str, query: &str) -> String {
    if query.is_empty() {
        return base.to_string();
    }
    let separator = match base.find('?') {
        None => "?",
        Some(_) if base.ends_with('?') || base.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{}{}{}", base, separator, query)
}
