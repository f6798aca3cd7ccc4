//! In-memory store for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use qrflow_core::{Campaign, Grouping, LookupStage, ScanCode, StoreError};

use crate::{ScanStore, StoreResult};

#[derive(Debug, Default)]
struct CallCounts {
    code: AtomicUsize,
    grouping: AtomicUsize,
    campaign: AtomicUsize,
    increment: AtomicUsize,
}

/// In-memory mock store.
///
/// Cloning shares the underlying maps, so a test can hand one clone to the
/// pipeline and inspect counters through another.
#[derive(Debug, Clone, Default)]
pub struct MockScanStore {
    codes: Arc<RwLock<HashMap<String, ScanCode>>>,
    groupings: Arc<RwLock<HashMap<String, Grouping>>>,
    campaigns: Arc<RwLock<HashMap<String, Campaign>>>,
    calls: Arc<CallCounts>,
    fail_lookups: Arc<AtomicBool>,
    fail_increments: Arc<AtomicBool>,
    increment_delay: Arc<RwLock<Option<Duration>>>,
}

fn poisoned() -> StoreError {
    StoreError::Unavailable {
        reason: "mock store lock poisoned".to_string(),
    }
}

impl MockScanStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a code with a zero scan counter.
    pub fn with_code(self, id: &str, grouping_ref: &str) -> Self {
        if let Ok(mut codes) = self.codes.write() {
            codes.insert(
                id.to_string(),
                ScanCode {
                    id: id.to_string(),
                    grouping_ref: grouping_ref.to_string(),
                    scan_count: 0,
                },
            );
        }
        self
    }

    pub fn with_grouping(self, id: &str, campaign_ref: &str) -> Self {
        if let Ok(mut groupings) = self.groupings.write() {
            groupings.insert(
                id.to_string(),
                Grouping {
                    id: id.to_string(),
                    campaign_ref: campaign_ref.to_string(),
                },
            );
        }
        self
    }

    /// Insert a campaign keyed by its id.
    pub fn with_campaign(self, campaign: Campaign) -> Self {
        let campaign_ref = campaign.id.clone();
        self.with_campaign_at(&campaign_ref, campaign)
    }

    /// Insert a campaign under an explicit reference, which may differ from
    /// the id the record carries.
    pub fn with_campaign_at(self, campaign_ref: &str, campaign: Campaign) -> Self {
        if let Ok(mut campaigns) = self.campaigns.write() {
            campaigns.insert(campaign_ref.to_string(), campaign);
        }
        self
    }

    /// Make every lookup fail as if the store were unreachable.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make scan count increments fail.
    pub fn fail_increments(&self, fail: bool) {
        self.fail_increments.store(fail, Ordering::SeqCst);
    }

    /// Delay each increment, to observe that callers do not wait on it.
    pub fn delay_increments(&self, delay: Option<Duration>) {
        if let Ok(mut slot) = self.increment_delay.write() {
            *slot = delay;
        }
    }

    /// Current counter for a code, if the code exists.
    pub fn scan_count(&self, code_id: &str) -> Option<i64> {
        self.codes
            .read()
            .ok()
            .and_then(|codes| codes.get(code_id).map(|code| code.scan_count))
    }

    /// Number of lookups issued against a chain stage.
    pub fn lookup_calls(&self, stage: LookupStage) -> usize {
        match stage {
            LookupStage::Code => self.calls.code.load(Ordering::SeqCst),
            LookupStage::Grouping => self.calls.grouping.load(Ordering::SeqCst),
            LookupStage::Campaign => self.calls.campaign.load(Ordering::SeqCst),
        }
    }

    /// Number of increment requests received, successful or not.
    pub fn increment_calls(&self) -> usize {
        self.calls.increment.load(Ordering::SeqCst)
    }

    fn check_lookup(&self, stage: LookupStage) -> StoreResult<()> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: format!("injected failure on {} lookup", stage),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ScanStore for MockScanStore {
    async fn lookup_code(&self, code: &str) -> StoreResult<Option<ScanCode>> {
        self.calls.code.fetch_add(1, Ordering::SeqCst);
        self.check_lookup(LookupStage::Code)?;
        let codes = self.codes.read().map_err(|_| poisoned())?;
        Ok(codes.get(code).cloned())
    }

    async fn lookup_grouping(&self, grouping_ref: &str) -> StoreResult<Option<Grouping>> {
        self.calls.grouping.fetch_add(1, Ordering::SeqCst);
        self.check_lookup(LookupStage::Grouping)?;
        let groupings = self.groupings.read().map_err(|_| poisoned())?;
        Ok(groupings.get(grouping_ref).cloned())
    }

    async fn lookup_campaign(&self, campaign_ref: &str) -> StoreResult<Option<Campaign>> {
        self.calls.campaign.fetch_add(1, Ordering::SeqCst);
        self.check_lookup(LookupStage::Campaign)?;
        let campaigns = self.campaigns.read().map_err(|_| poisoned())?;
        Ok(campaigns.get(campaign_ref).cloned())
    }

    async fn increment_scan_count(&self, code_id: &str) -> StoreResult<i64> {
        self.calls.increment.fetch_add(1, Ordering::SeqCst);

        let delay = *self.increment_delay.read().map_err(|_| poisoned())?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(StoreError::UpdateFailed {
                code_id: code_id.to_string(),
                reason: "injected increment failure".to_string(),
            });
        }

        let mut codes = self.codes.write().map_err(|_| poisoned())?;
        match codes.get_mut(code_id) {
            Some(code) => {
                code.scan_count += 1;
                tracing::trace!(code_id, scan_count = code.scan_count, "mock scan count incremented");
                Ok(code.scan_count)
            }
            None => Err(StoreError::UpdateFailed {
                code_id: code_id.to_string(),
                reason: "code does not exist".to_string(),
            }),
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check_lookup(LookupStage::Code)
    }
}
