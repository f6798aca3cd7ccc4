//! API Configuration Module
//!
//! Configuration for navigation targets, the preview token exchange, CORS
//! and the caller-side resolution timeout. Everything is loaded from
//! environment variables with defaults suitable for local development.

use std::time::Duration;

use qrflow_core::ConfigError;

use crate::exchange::PreviewSecret;

/// Minimum preview secret length accepted in production.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.parse().ok())
}

/// Check if running in a production environment.
pub fn is_production_environment() -> bool {
    env_var("QRFLOW_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

fn require_absolute_url(field: &str, value: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Navigation targets, CORS and timeouts.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the flow runtime; session parameters are appended to it.
    pub flow_base_url: String,

    /// Page that renders the not-found state; `?error=<code>` is appended.
    pub not_found_url: String,

    /// Upper bound on one pipeline run, imposed by the HTTP handlers.
    pub resolve_timeout: Duration,

    /// Allowed CORS origins. Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            flow_base_url: "http://localhost:5173/flow".to_string(),
            not_found_url: "http://localhost:5173/not-found".to_string(),
            resolve_timeout: Duration::from_secs(10),
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// - `QRFLOW_FLOW_BASE_URL`: flow runtime entry (default: http://localhost:5173/flow)
    /// - `QRFLOW_NOT_FOUND_URL`: not-found page (default: http://localhost:5173/not-found)
    /// - `QRFLOW_RESOLVE_TIMEOUT_SECS`: pipeline timeout (default: 10)
    /// - `QRFLOW_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    /// - `QRFLOW_CORS_MAX_AGE_SECS`: preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = env_var("QRFLOW_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            flow_base_url: env_var("QRFLOW_FLOW_BASE_URL").unwrap_or(defaults.flow_base_url),
            not_found_url: env_var("QRFLOW_NOT_FOUND_URL").unwrap_or(defaults.not_found_url),
            resolve_timeout: env_parse("QRFLOW_RESOLVE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.resolve_timeout),
            cors_origins,
            cors_max_age_secs: env_parse("QRFLOW_CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
        }
    }

    /// Check that both navigation targets are absolute http(s) URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_absolute_url("flow_base_url", &self.flow_base_url)?;
        require_absolute_url("not_found_url", &self.not_found_url)?;
        if self.resolve_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "resolve_timeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Production requires an explicit CORS allow-list.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.cors_origins.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "QRFLOW_CORS_ORIGINS".to_string(),
            });
        }
        Ok(())
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.brand.example
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

// ============================================================================
// EXCHANGE CONFIGURATION
// ============================================================================

/// Which preview token exchange the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeMode {
    /// Remote trusted exchange over HTTP (default)
    #[default]
    Http,

    /// In-process exchange verifying tokens with the shared secret
    Local,
}

impl std::str::FromStr for ExchangeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(ExchangeMode::Http),
            "local" => Ok(ExchangeMode::Local),
            other => Err(ConfigError::InvalidValue {
                field: "QRFLOW_EXCHANGE_MODE".to_string(),
                value: other.to_string(),
                reason: "expected 'http' or 'local'".to_string(),
            }),
        }
    }
}

/// Preview token exchange configuration.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub mode: ExchangeMode,

    /// Endpoint of the trusted exchange (http mode)
    pub url: Option<String>,

    /// Request timeout for the exchange call
    pub timeout: Duration,

    /// Shared signing secret (local mode)
    pub preview_secret: Option<PreviewSecret>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            mode: ExchangeMode::default(),
            url: None,
            timeout: Duration::from_secs(5),
            preview_secret: None,
        }
    }
}

impl ExchangeConfig {
    /// Create ExchangeConfig from environment variables.
    ///
    /// - `QRFLOW_EXCHANGE_MODE`: "http" | "local" (default: http)
    /// - `QRFLOW_EXCHANGE_URL`: trusted exchange endpoint
    /// - `QRFLOW_EXCHANGE_TIMEOUT_SECS`: request timeout (default: 5)
    /// - `QRFLOW_PREVIEW_SECRET`: shared signing secret for local mode
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match env_var("QRFLOW_EXCHANGE_MODE") {
            Some(raw) => raw.parse()?,
            None => ExchangeMode::default(),
        };

        let preview_secret = match env_var("QRFLOW_PREVIEW_SECRET") {
            Some(raw) => Some(PreviewSecret::new(raw)?),
            None => None,
        };

        Ok(Self {
            mode,
            url: env_var("QRFLOW_EXCHANGE_URL"),
            timeout: env_parse("QRFLOW_EXCHANGE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(5)),
            preview_secret,
        })
    }

    /// Check that the selected mode has what it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            ExchangeMode::Http => {
                let url = self.url.as_deref().ok_or_else(|| ConfigError::MissingRequired {
                    field: "QRFLOW_EXCHANGE_URL".to_string(),
                })?;
                require_absolute_url("QRFLOW_EXCHANGE_URL", url)
            }
            ExchangeMode::Local => {
                if self.preview_secret.is_none() {
                    return Err(ConfigError::MissingRequired {
                        field: "QRFLOW_PREVIEW_SECRET".to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Production must delegate to the trusted exchange.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.mode == ExchangeMode::Local {
            return Err(ConfigError::InvalidValue {
                field: "QRFLOW_EXCHANGE_MODE".to_string(),
                value: "local".to_string(),
                reason: "the in-process exchange is for development only".to_string(),
            });
        }
        if let Some(secret) = &self.preview_secret {
            if secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::InvalidValue {
                    field: "QRFLOW_PREVIEW_SECRET".to_string(),
                    value: "[REDACTED]".to_string(),
                    reason: format!(
                        "must be at least {} characters",
                        MIN_PRODUCTION_SECRET_LEN
                    ),
                });
            }
        }
        Ok(())
    }
}
