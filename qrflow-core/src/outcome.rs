//! Navigation outcomes and their machine-readable codes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::session::{append_query, ResolvedSession};

/// Machine-readable reason carried by a not-found or fallback outcome.
///
/// Rendered as the `error` query parameter of the not-found page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeCode {
    // Scan path
    MissingCode,
    CodeNotFound,
    GroupingNotFound,
    CampaignNotFound,
    NoCampaignData,
    ProcessingError,

    // Preview path
    MissingToken,
    MalformedToken,
    ExpiredToken,
    WrongMode,
    ExchangeFailed,
}

impl OutcomeCode {
    pub const ALL: [OutcomeCode; 11] = [
        OutcomeCode::MissingCode,
        OutcomeCode::CodeNotFound,
        OutcomeCode::GroupingNotFound,
        OutcomeCode::CampaignNotFound,
        OutcomeCode::NoCampaignData,
        OutcomeCode::ProcessingError,
        OutcomeCode::MissingToken,
        OutcomeCode::MalformedToken,
        OutcomeCode::ExpiredToken,
        OutcomeCode::WrongMode,
        OutcomeCode::ExchangeFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCode::MissingCode => "missing-code",
            OutcomeCode::CodeNotFound => "code-not-found",
            OutcomeCode::GroupingNotFound => "grouping-not-found",
            OutcomeCode::CampaignNotFound => "campaign-not-found",
            OutcomeCode::NoCampaignData => "no-campaign-data",
            OutcomeCode::ProcessingError => "processing-error",
            OutcomeCode::MissingToken => "missing-token",
            OutcomeCode::MalformedToken => "malformed-token",
            OutcomeCode::ExpiredToken => "expired-token",
            OutcomeCode::WrongMode => "wrong-mode",
            OutcomeCode::ExchangeFailed => "exchange-failed",
        }
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutcomeCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| format!("unknown outcome code: {}", s))
    }
}

/// The single navigation decision produced for one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Navigation {
    /// Enter the flow runtime with a live session
    Session { session: ResolvedSession },
    /// Leave for the campaign's configured fallback destination
    Fallback { url: String, reason: OutcomeCode },
    /// Render the not-found state
    NotFound { code: OutcomeCode },
}

impl Navigation {
    pub fn not_found(code: OutcomeCode) -> Self {
        Navigation::NotFound { code }
    }

    /// Absolute destination for this outcome.
    pub fn location(&self, flow_base_url: &str, not_found_url: &str) -> String {
        match self {
            Navigation::Session { session } => session.entry_url(flow_base_url),
            Navigation::Fallback { url, .. } => url.clone(),
            Navigation::NotFound { code } => {
                let query = format!("error={}", urlencoding::encode(code.as_str()));
                append_query(not_found_url, &query)
            }
        }
    }

    /// Label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Navigation::Session { .. } => "session",
            Navigation::Fallback { .. } => "fallback",
            Navigation::NotFound { .. } => "not_found",
        }
    }

    /// Failure reason, if this outcome is not a session.
    pub fn code(&self) -> Option<OutcomeCode> {
        match self {
            Navigation::Session { .. } => None,
            Navigation::Fallback { reason, .. } => Some(*reason),
            Navigation::NotFound { code } => Some(*code),
        }
    }
}
