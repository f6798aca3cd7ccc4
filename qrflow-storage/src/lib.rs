//! qrflow Storage - Store Trait and Mock Implementation
//!
//! Defines the request/response contracts the resolution pipeline consumes
//! from the external data store. The PostgreSQL implementation lives in
//! qrflow-api.

pub mod mock;

pub use mock::MockScanStore;

use async_trait::async_trait;
use qrflow_core::{Campaign, Grouping, ScanCode, StoreError};

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Read and increment contracts against the external data store.
///
/// Lookups return `Ok(None)` for a missing record; `Err` is reserved for the
/// store itself failing (unreachable, malformed response).
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Resolve a scanned code to its record.
    async fn lookup_code(&self, code: &str) -> StoreResult<Option<ScanCode>>;

    /// Resolve a batch reference.
    async fn lookup_grouping(&self, grouping_ref: &str) -> StoreResult<Option<Grouping>>;

    /// Resolve a campaign reference.
    async fn lookup_campaign(&self, campaign_ref: &str) -> StoreResult<Option<Campaign>>;

    /// Add exactly one to a code's scan counter and return the new value.
    ///
    /// Implementations apply the increment atomically on the store side.
    async fn increment_scan_count(&self, code_id: &str) -> StoreResult<i64>;

    /// Connectivity probe for readiness checks.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
