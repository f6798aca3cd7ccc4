//! Code Lookup Chain
//!
//! Three strictly sequential, dependent reads: code -> grouping -> campaign.
//! Each step's input comes from the previous step's output, so nothing here
//! runs concurrently. Expected not-found outcomes are values, store faults
//! are errors.

use std::sync::Arc;

use qrflow_core::{Campaign, Grouping, LookupStage, OutcomeCode, ScanCode};
use qrflow_storage::{ScanStore, StoreResult};

/// A scan code resolved all the way to its campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCode {
    /// Code exactly as scanned
    pub scanned: String,
    pub code: ScanCode,
    pub grouping: Grouping,
    pub campaign: Campaign,
}

/// Expected chain termination, tagged with the stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFailure {
    CodeNotFound,
    GroupingNotFound,
    CampaignNotFound,
}

impl ChainFailure {
    pub fn stage(&self) -> LookupStage {
        match self {
            ChainFailure::CodeNotFound => LookupStage::Code,
            ChainFailure::GroupingNotFound => LookupStage::Grouping,
            ChainFailure::CampaignNotFound => LookupStage::Campaign,
        }
    }

    pub fn code(&self) -> OutcomeCode {
        match self {
            ChainFailure::CodeNotFound => OutcomeCode::CodeNotFound,
            ChainFailure::GroupingNotFound => OutcomeCode::GroupingNotFound,
            ChainFailure::CampaignNotFound => OutcomeCode::CampaignNotFound,
        }
    }
}

/// Outcome of a chain run that did not fault.
pub type ChainResult = Result<ResolvedCode, ChainFailure>;

/// Runs the code -> grouping -> campaign lookups against a store.
#[derive(Clone)]
pub struct CodeLookupChain {
    store: Arc<dyn ScanStore>,
}

impl CodeLookupChain {
    pub fn new(store: Arc<dyn ScanStore>) -> Self {
        Self { store }
    }

    /// Resolve `scanned` to its campaign.
    ///
    /// `on_code_found` runs exactly once, immediately after step 1 succeeds
    /// and before step 2 is issued. It never runs for an unknown code.
    ///
    /// # Errors
    /// Returns the store's error if any lookup faults. Steps after the fault
    /// are not attempted.
    pub async fn resolve<F>(&self, scanned: &str, on_code_found: F) -> StoreResult<ChainResult>
    where
        F: FnOnce(&ScanCode) + Send,
    {
        let Some(code) = self.store.lookup_code(scanned).await? else {
            tracing::debug!(stage = %LookupStage::Code, "Scan code not found");
            return Ok(Err(ChainFailure::CodeNotFound));
        };

        on_code_found(&code);

        let Some(grouping) = self.store.lookup_grouping(&code.grouping_ref).await? else {
            tracing::debug!(
                stage = %LookupStage::Grouping,
                grouping_ref = %code.grouping_ref,
                "Grouping not found"
            );
            return Ok(Err(ChainFailure::GroupingNotFound));
        };

        let Some(campaign) = self.store.lookup_campaign(&grouping.campaign_ref).await? else {
            tracing::debug!(
                stage = %LookupStage::Campaign,
                campaign_ref = %grouping.campaign_ref,
                "Campaign not found"
            );
            return Ok(Err(ChainFailure::CampaignNotFound));
        };

        Ok(Ok(ResolvedCode {
            scanned: scanned.to_string(),
            code,
            grouping,
            campaign,
        }))
    }
}
