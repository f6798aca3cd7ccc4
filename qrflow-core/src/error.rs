//! Error types for qrflow operations
//!
//! Expected not-found results are not errors; store lookups return
//! `Ok(None)` for those. The types here cover genuine faults.

use crate::LookupStage;
use thiserror::Error;

/// Data store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Malformed {stage} record: {reason}")]
    MalformedRecord { stage: LookupStage, reason: String },

    #[error("Scan count update failed for code {code_id}: {reason}")]
    UpdateFailed { code_id: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Preview token exchange errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Exchange request failed: {reason}")]
    Transport { reason: String },

    #[error("Exchange rejected token with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid exchange response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Exchange timed out after {secs}s")]
    TimedOut { secs: u64 },
}

/// Master error type for all qrflow errors.
#[derive(Debug, Clone, Error)]
pub enum QrflowError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_malformed() {
        let err = StoreError::MalformedRecord {
            stage: LookupStage::Grouping,
            reason: "campaign_ref is null".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Malformed grouping record"));
        assert!(msg.contains("campaign_ref is null"));
    }

    #[test]
    fn test_exchange_error_display_rejected() {
        let err = ExchangeError::Rejected {
            status: 403,
            message: "signature mismatch".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("signature mismatch"));
    }

    #[test]
    fn test_qrflow_error_from_variants() {
        let store = QrflowError::from(StoreError::Unavailable {
            reason: "connection refused".to_string(),
        });
        assert!(matches!(store, QrflowError::Store(_)));

        let config = QrflowError::from(ConfigError::MissingRequired {
            field: "preview_secret".to_string(),
        });
        assert!(matches!(config, QrflowError::Config(_)));

        let exchange = QrflowError::from(ExchangeError::TimedOut { secs: 5 });
        assert!(matches!(exchange, QrflowError::Exchange(_)));
    }
}
