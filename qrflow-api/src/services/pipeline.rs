//! Resolution Pipeline
//!
//! Entry point for both the scan path and the preview path. Every call ends
//! in exactly one [`Navigation`]; store faults never escape.

use std::sync::Arc;

use qrflow_core::{Navigation, ScanCode};
use qrflow_storage::ScanStore;

use super::accounting::{PendingIncrement, ScanAccounting};
use super::lookup_chain::CodeLookupChain;
use super::preview::{BootstrapRun, PreviewBootstrap};
use super::redirect::{RedirectPolicy, ScanResolution};
use crate::clock::Clock;
use crate::exchange::PreviewExchange;
use crate::telemetry::metrics;

/// Result of one scan resolution.
#[derive(Debug)]
pub struct ScanOutcome {
    pub navigation: Navigation,
    /// Increment issued for the scanned code, if step 1 found it.
    pub accounting: Option<PendingIncrement>,
}

/// Result of one preview bootstrap.
#[derive(Debug)]
pub struct PreviewOutcome {
    pub navigation: Navigation,
    pub run: BootstrapRun,
}

/// Scan and preview resolution, wired to its collaborators.
#[derive(Clone)]
pub struct ResolutionPipeline {
    chain: CodeLookupChain,
    accounting: ScanAccounting,
    policy: RedirectPolicy,
    preview: PreviewBootstrap,
}

impl ResolutionPipeline {
    pub fn new(
        store: Arc<dyn ScanStore>,
        exchange: Arc<dyn PreviewExchange>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chain: CodeLookupChain::new(Arc::clone(&store)),
            accounting: ScanAccounting::new(store),
            policy: RedirectPolicy::new(),
            preview: PreviewBootstrap::new(exchange, clock),
        }
    }

    /// Resolve a scanned code. `None` or a blank code is `missing-code`.
    ///
    /// The scan increment is spawned as soon as the code is found and is
    /// not awaited here.
    pub async fn resolve_scan(&self, code: Option<&str>) -> ScanOutcome {
        let Some(scanned) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return self.finish_scan(ScanResolution::MissingCode, None);
        };

        let mut accounting = None;
        let record = |code: &ScanCode| accounting = Some(self.accounting.record(code));

        let resolution = match self.chain.resolve(scanned, record).await {
            Ok(Ok(resolved)) => ScanResolution::Resolved(resolved),
            Ok(Err(failure)) => ScanResolution::Failed(failure),
            Err(fault) => ScanResolution::Fault(fault),
        };

        self.finish_scan(resolution, accounting)
    }

    /// Bootstrap a preview session from a token.
    pub async fn resolve_preview(&self, token: Option<&str>) -> PreviewOutcome {
        let run = self.preview.run(token).await;
        let navigation = self.policy.decide_preview(run.result.clone());

        if let Some(m) = metrics() {
            let outcome = navigation.code().map_or("ready", |c| c.as_str());
            m.record_preview_bootstrap(outcome);
            m.record_resolution("preview", navigation.code().map_or("session", |c| c.as_str()));
        }

        PreviewOutcome { navigation, run }
    }

    fn finish_scan(
        &self,
        resolution: ScanResolution,
        accounting: Option<PendingIncrement>,
    ) -> ScanOutcome {
        let navigation = self.policy.decide_scan(resolution);

        tracing::info!(
            outcome = navigation.kind(),
            code = navigation.code().map(|c| c.as_str()),
            counted = accounting.is_some(),
            "Scan resolved"
        );
        if let Some(m) = metrics() {
            m.record_resolution("scan", navigation.code().map_or("session", |c| c.as_str()));
        }

        ScanOutcome {
            navigation,
            accounting,
        }
    }
}
