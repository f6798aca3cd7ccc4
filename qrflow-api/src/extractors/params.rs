//! Dual-channel parameter extractor.
//!
//! The primary channel is the request's own query string. The secondary
//! channel is the client-side routing fragment, which browsers never send,
//! so the caller forwards it in the `X-Route-Fragment` header.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use qrflow_core::{resolve_params, ResolvedParams};

/// Header carrying the client's routing fragment, e.g. `#/scan?qr=ABC123`.
pub const ROUTE_FRAGMENT_HEADER: &str = "x-route-fragment";

/// Both raw parameter channels of a navigational request.
///
/// Never rejects; absent channels are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamChannels {
    pub primary: String,
    pub fragment: Option<String>,
}

impl ParamChannels {
    pub fn new(primary: impl Into<String>, fragment: Option<&str>) -> Self {
        Self {
            primary: primary.into(),
            fragment: fragment.map(str::to_string),
        }
    }

    pub fn resolve(&self, names: &[&str]) -> ResolvedParams {
        resolve_params(&self.primary, self.fragment.as_deref(), names)
    }

    /// Resolve a single parameter.
    pub fn get(&self, name: &str) -> Option<String> {
        self.resolve(&[name]).remove(name).flatten()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ParamChannels
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let primary = parts.uri.query().unwrap_or_default().to_string();
        let fragment = parts
            .headers
            .get(ROUTE_FRAGMENT_HEADER)
            .and_then(|value| match value.to_str() {
                Ok(fragment) => Some(fragment.to_string()),
                Err(_) => {
                    tracing::debug!("Ignoring non-ASCII route fragment header");
                    None
                }
            });

        Ok(Self { primary, fragment })
    }
}
