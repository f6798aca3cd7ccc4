//! Scan Accounting
//!
//! Fire-and-forget scan counter increments. The increment runs on a detached
//! task; the redirect decision never waits for it and its failure is only
//! logged.

use std::sync::Arc;

use qrflow_core::ScanCode;
use qrflow_storage::ScanStore;
use tokio::task::JoinHandle;

use crate::telemetry::metrics;

/// Handle to an increment already in flight.
///
/// Dropping it detaches the task; the increment still completes.
#[derive(Debug)]
pub struct PendingIncrement {
    code_id: String,
    handle: JoinHandle<Option<i64>>,
}

impl PendingIncrement {
    pub fn code_id(&self) -> &str {
        &self.code_id
    }

    /// Wait for the increment to finish. Returns the new counter value, or
    /// `None` if the store rejected the increment.
    ///
    /// Only for callers that are off the redirect path (tests, shutdown).
    pub async fn settled(self) -> Option<i64> {
        self.handle.await.ok().flatten()
    }
}

/// Issues best-effort scan counter increments.
#[derive(Clone)]
pub struct ScanAccounting {
    store: Arc<dyn ScanStore>,
}

impl ScanAccounting {
    pub fn new(store: Arc<dyn ScanStore>) -> Self {
        Self { store }
    }

    /// Spawn one increment for `code`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn record(&self, code: &ScanCode) -> PendingIncrement {
        let store = Arc::clone(&self.store);
        let code_id = code.id.clone();
        let task_code_id = code_id.clone();

        let handle = tokio::spawn(async move {
            match store.increment_scan_count(&task_code_id).await {
                Ok(scan_count) => {
                    tracing::debug!(code_id = %task_code_id, scan_count, "Scan recorded");
                    if let Some(m) = metrics() {
                        m.record_scan_increment(true);
                    }
                    Some(scan_count)
                }
                Err(e) => {
                    tracing::warn!(code_id = %task_code_id, error = %e, "Failed to record scan");
                    if let Some(m) = metrics() {
                        m.record_scan_increment(false);
                    }
                    None
                }
            }
        });

        PendingIncrement { code_id, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrflow_storage::MockScanStore;
    use std::time::Duration;

    fn code(id: &str) -> ScanCode {
        ScanCode {
            id: id.to_string(),
            grouping_ref: "B1".to_string(),
            scan_count: 0,
        }
    }

    #[tokio::test]
    async fn test_record_increments_by_one() {
        let store = MockScanStore::new().with_code("ABC123", "B1");
        let accounting = ScanAccounting::new(Arc::new(store.clone()));

        let pending = accounting.record(&code("ABC123"));
        assert_eq!(pending.code_id(), "ABC123");
        assert_eq!(pending.settled().await, Some(1));
        assert_eq!(store.scan_count("ABC123"), Some(1));
    }

    #[tokio::test]
    async fn test_failed_increment_is_swallowed() {
        let store = MockScanStore::new().with_code("ABC123", "B1");
        store.fail_increments(true);
        let accounting = ScanAccounting::new(Arc::new(store.clone()));

        assert_eq!(accounting.record(&code("ABC123")).settled().await, None);
        assert_eq!(store.scan_count("ABC123"), Some(0));
        assert_eq!(store.increment_calls(), 1);
    }

    #[tokio::test]
    async fn test_record_does_not_wait_for_store() {
        let store = MockScanStore::new().with_code("ABC123", "B1");
        store.delay_increments(Some(Duration::from_millis(200)));
        let accounting = ScanAccounting::new(Arc::new(store.clone()));

        let started = std::time::Instant::now();
        let pending = accounting.record(&code("ABC123"));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(store.scan_count("ABC123"), Some(0));

        assert_eq!(pending.settled().await, Some(1));
    }

    #[tokio::test]
    async fn test_dropped_handle_still_completes() {
        let store = MockScanStore::new().with_code("ABC123", "B1");
        let accounting = ScanAccounting::new(Arc::new(store.clone()));

        drop(accounting.record(&code("ABC123")));
        for _ in 0..50 {
            if store.scan_count("ABC123") == Some(1) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("detached increment never completed");
    }
}
