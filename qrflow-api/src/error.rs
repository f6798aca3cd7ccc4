//! Error Types for qrflow API
//!
//! Resolution outcomes (not-found, fallback) are NOT ApiErrors; they are
//! navigation decisions. ApiError covers startup, configuration and
//! infrastructure failures surfaced by `main`.

use qrflow_core::{ConfigError, QrflowError, StoreError};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Categories of startup and infrastructure failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Configuration or environment input is invalid
    InvalidInput,

    /// Internal failure (subscriber, registry, listener)
    InternalError,

    /// Database pool could not be built
    DatabaseError,

    /// Upstream collaborator could not be set up
    UpstreamError,

    /// Backing service is unavailable
    ServiceUnavailable,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn upstream_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// CONVERSIONS FROM CORE ERRORS
// ============================================================================

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Store error");
        match err {
            StoreError::Unavailable { reason } => ApiError::service_unavailable(reason),
            other => ApiError::database_error(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

impl From<QrflowError> for ApiError {
    fn from(err: QrflowError) -> Self {
        match err {
            QrflowError::Store(e) => e.into(),
            QrflowError::Config(e) => e.into(),
            QrflowError::Exchange(e) => ApiError::upstream_error(e.to_string()),
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
