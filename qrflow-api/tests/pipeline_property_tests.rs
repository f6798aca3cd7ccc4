//! Property-Based Tests for the Resolution Pipeline
//!
//! Drives the scan and preview paths end to end over the in-memory store:
//! - Unknown codes never touch the scan counter
//! - A found code is counted once per lookup, whatever happens downstream
//! - Fully resolved chains enter a session carrying `cid` and `qr`
//! - Preview tokens are rejected in order, before any exchange call

use std::sync::Arc;

use proptest::prelude::*;
use qrflow_api::{
    BootstrapState, FixedClock, LocalPreviewExchange, ParamChannels, PreviewSecret, ResolutionPipeline,
    ScanOutcome,
};
use qrflow_core::{LookupStage, Navigation, OutcomeCode};
use qrflow_test_utils::assertions::{assert_fallback, assert_not_found, assert_session};
use qrflow_test_utils::fixtures::{self, CAMPAIGN, CODE, FLOW_BASE_URL, GROUPING, NOT_FOUND_URL, NOW};
use qrflow_test_utils::generators::{arb_code, arb_param_name, arb_param_value, arb_wrong_segment_token};
use qrflow_test_utils::{tokens, MockScanStore};
use tokio::runtime::Runtime;

#[path = "support/app.rs"]
mod test_app_support;
#[path = "support/exchange.rs"]
mod test_exchange_support;
use test_app_support::test_pipeline;
use test_exchange_support::{CountingExchange, RejectingExchange, StaticExchange};

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

/// Wait for the detached increment so counters can be inspected.
async fn settle(outcome: ScanOutcome) -> (Navigation, Option<i64>) {
    let count = match outcome.accounting {
        Some(pending) => pending.settled().await,
        None => None,
    };
    (outcome.navigation, count)
}

fn location(navigation: &Navigation) -> String {
    navigation.location(FLOW_BASE_URL, NOT_FOUND_URL)
}

// ============================================================================
// END-TO-END SCENARIOS
// ============================================================================

#[tokio::test]
async fn scenario_scan_resolves_to_session() {
    let store = fixtures::seeded_store();
    let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

    let (navigation, count) = settle(pipeline.resolve_scan(Some(CODE)).await).await;

    assert_eq!(location(&navigation), format!("{}?cid=C1&qr=ABC123", FLOW_BASE_URL));
    assert_eq!(count, Some(1));
    assert_eq!(store.scan_count(CODE), Some(1));
}

#[tokio::test]
async fn scenario_missing_campaign_is_not_found() {
    let store = fixtures::store_missing_campaign();
    let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

    let (navigation, count) = settle(pipeline.resolve_scan(Some(CODE)).await).await;

    assert_not_found(&navigation, OutcomeCode::CampaignNotFound);
    assert_eq!(
        location(&navigation),
        format!("{}?error=campaign-not-found", NOT_FOUND_URL)
    );
    // Counted on step 1 even though step 3 failed.
    assert_eq!(count, Some(1));
}

#[tokio::test]
async fn scenario_preview_token_enters_test_session() {
    let store = MockScanStore::new();
    let exchange = CountingExchange::new(StaticExchange::granting("C9"));
    let pipeline = test_pipeline(&store, exchange.clone());

    let token = tokens::unsigned(&tokens::claims(Some("C9"), NOW + 3600));
    let outcome = pipeline.resolve_preview(Some(&token)).await;

    assert_eq!(
        location(&outcome.navigation),
        format!("{}?cid=C9&session=sess-preview-1&test=true", FLOW_BASE_URL)
    );
    assert_eq!(
        outcome.run.trace,
        vec![
            BootstrapState::Pending,
            BootstrapState::Validating,
            BootstrapState::Exchanging,
            BootstrapState::Ready,
        ]
    );
    assert_eq!(exchange.calls(), 1);
}

#[tokio::test]
async fn scenario_signed_token_through_local_exchange() -> Result<(), qrflow_core::ConfigError> {
    let secret = PreviewSecret::new(tokens::TEST_SECRET.to_string())?;
    let exchange = LocalPreviewExchange::new(secret).with_clock(Arc::new(FixedClock(NOW)));
    let store = MockScanStore::new();
    let pipeline = ResolutionPipeline::new(Arc::new(store), Arc::new(exchange), Arc::new(FixedClock(NOW)));

    let token = tokens::signed(&tokens::claims(Some("C9"), NOW + 3600), tokens::TEST_SECRET);
    let outcome = pipeline.resolve_preview(Some(&token)).await;
    let session = assert_session(&outcome.navigation);
    assert_eq!(session.campaign_id, "C9");
    assert!(session.test);
    assert!(session.session_id.is_some());

    // Same claims, wrong key: structurally valid, refused by the exchange.
    let forged = tokens::signed(&tokens::claims(Some("C9"), NOW + 3600), "some-other-secret");
    let outcome = ResolutionPipeline::new(
        Arc::new(MockScanStore::new()),
        Arc::new(
            LocalPreviewExchange::new(PreviewSecret::new(tokens::TEST_SECRET.to_string())?)
                .with_clock(Arc::new(FixedClock(NOW))),
        ),
        Arc::new(FixedClock(NOW)),
    )
    .resolve_preview(Some(&forged))
    .await;
    assert_not_found(&outcome.navigation, OutcomeCode::ExchangeFailed);
    Ok(())
}

#[tokio::test]
async fn test_blank_campaign_uses_fallback_when_configured() {
    let store = fixtures::store_blank_campaign(Some("https://brand.example/help"));
    let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

    let (navigation, _) = settle(pipeline.resolve_scan(Some(CODE)).await).await;
    assert_fallback(&navigation, "https://brand.example/help");
    assert_eq!(navigation.code(), Some(OutcomeCode::NoCampaignData));

    let store = fixtures::store_blank_campaign(None);
    let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));
    let (navigation, _) = settle(pipeline.resolve_scan(Some(CODE)).await).await;
    assert_not_found(&navigation, OutcomeCode::NoCampaignData);
}

#[tokio::test]
async fn test_fallback_never_used_before_campaign_reached() {
    // The only campaign in the store has a fallback, but B1 is missing.
    let store = fixtures::store_missing_grouping()
        .with_campaign(fixtures::campaign_with_fallback(CAMPAIGN, "https://brand.example/help"));
    let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

    let (navigation, _) = settle(pipeline.resolve_scan(Some(CODE)).await).await;
    assert_not_found(&navigation, OutcomeCode::GroupingNotFound);
    assert_eq!(store.lookup_calls(LookupStage::Campaign), 0);
}

#[tokio::test]
async fn test_failed_increment_does_not_change_outcome() {
    let store = fixtures::seeded_store();
    store.fail_increments(true);
    let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

    let (navigation, count) = settle(pipeline.resolve_scan(Some(CODE)).await).await;
    assert_eq!(location(&navigation), format!("{}?cid=C1&qr=ABC123", FLOW_BASE_URL));
    assert_eq!(count, None);
    assert_eq!(store.increment_calls(), 1);
    assert_eq!(store.scan_count(CODE), Some(0));
}

#[tokio::test]
async fn test_exchange_rejection_is_exchange_failed() {
    let exchange = CountingExchange::new(RejectingExchange);
    let pipeline = test_pipeline(&MockScanStore::new(), exchange.clone());

    let token = tokens::unsigned(&tokens::claims(Some("C9"), NOW + 3600));
    let outcome = pipeline.resolve_preview(Some(&token)).await;

    assert_not_found(&outcome.navigation, OutcomeCode::ExchangeFailed);
    assert_eq!(outcome.run.final_state(), BootstrapState::Rejected);
    assert_eq!(exchange.calls(), 1);
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Unknown codes end in `code-not-found` and are never counted,
    /// however often they are retried.
    #[test]
    fn prop_unknown_code_is_never_counted(code in arb_code(), attempts in 1usize..4) {
        prop_assume!(code != CODE);
        let rt = test_runtime()?;
        rt.block_on(async {
            let store = fixtures::seeded_store();
            let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

            for _ in 0..attempts {
                let outcome = pipeline.resolve_scan(Some(&code)).await;
                prop_assert!(outcome.accounting.is_none());
                prop_assert_eq!(
                    outcome.navigation,
                    Navigation::not_found(OutcomeCode::CodeNotFound)
                );
            }

            prop_assert_eq!(store.increment_calls(), 0);
            prop_assert_eq!(store.lookup_calls(LookupStage::Grouping), 0);
            prop_assert_eq!(store.scan_count(CODE), Some(0));
            Ok(())
        })?;
    }

    /// A code whose batch is missing is still counted exactly once per scan.
    #[test]
    fn prop_missing_grouping_still_counts(code in arb_code()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let store = MockScanStore::new().with_code(&code, GROUPING);
            let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

            let (navigation, count) = settle(pipeline.resolve_scan(Some(&code)).await).await;

            prop_assert_eq!(navigation, Navigation::not_found(OutcomeCode::GroupingNotFound));
            prop_assert_eq!(count, Some(1));
            prop_assert_eq!(store.increment_calls(), 1);
            prop_assert_eq!(store.lookup_calls(LookupStage::Campaign), 0);
            Ok(())
        })?;
    }

    /// Fully resolved chains enter a session with `cid` and `qr` set.
    #[test]
    fn prop_resolved_chain_enters_session(code in arb_code(), campaign_id in "[A-Z][0-9]{1,4}") {
        let rt = test_runtime()?;
        rt.block_on(async {
            let store = MockScanStore::new()
                .with_code(&code, GROUPING)
                .with_grouping(GROUPING, &campaign_id)
                .with_campaign(fixtures::campaign_with_fallback(&campaign_id, "https://brand.example/help"));
            let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

            let (navigation, _) = settle(pipeline.resolve_scan(Some(&code)).await).await;

            match &navigation {
                Navigation::Session { session } => {
                    prop_assert_eq!(&session.campaign_id, &campaign_id);
                    prop_assert_eq!(session.scan_code.as_deref(), Some(code.as_str()));
                    prop_assert!(!session.test);
                }
                other => prop_assert!(false, "expected session, got {:?}", other),
            }
            prop_assert_eq!(
                location(&navigation),
                format!("{}?cid={}&qr={}", FLOW_BASE_URL, campaign_id, code)
            );
            Ok(())
        })?;
    }

    /// N lookups of a found code add exactly N to its counter, whatever
    /// the downstream outcome.
    #[test]
    fn prop_counter_is_monotonic(scans in 1usize..8, campaign_present in any::<bool>()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let store = if campaign_present {
                fixtures::seeded_store()
            } else {
                fixtures::store_missing_campaign()
            };
            let pipeline = test_pipeline(&store, StaticExchange::granting("C9"));

            let mut pending = Vec::with_capacity(scans);
            for _ in 0..scans {
                let outcome = pipeline.resolve_scan(Some(CODE)).await;
                prop_assert!(outcome.accounting.is_some());
                pending.extend(outcome.accounting);
            }
            for increment in pending {
                prop_assert!(increment.settled().await.is_some());
            }

            prop_assert_eq!(store.scan_count(CODE), Some(scans as i64));
            Ok(())
        })?;
    }

    /// A name present in both channels resolves to the query string's value;
    /// a name only in the fragment resolves from there.
    #[test]
    fn prop_query_string_takes_precedence(
        name in arb_param_name(),
        primary in arb_param_value(),
        fragment in arb_param_value(),
    ) {
        let both = ParamChannels::new(
            format!("{}={}", name, primary),
            Some(&format!("#/scan?{}={}", name, fragment)),
        );
        prop_assert_eq!(both.get(&name), Some(primary));

        let fragment_only = ParamChannels::new("", Some(&format!("#/scan?{}={}", name, fragment)));
        prop_assert_eq!(fragment_only.get(&name), Some(fragment));
    }

    /// Tokens that are not three segments are malformed and never reach
    /// the exchange.
    #[test]
    fn prop_wrong_segment_count_is_malformed(token in arb_wrong_segment_token()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let exchange = CountingExchange::new(StaticExchange::granting("C9"));
            let pipeline = test_pipeline(&MockScanStore::new(), exchange.clone());

            let outcome = pipeline.resolve_preview(Some(&token)).await;

            prop_assert_eq!(
                outcome.navigation,
                Navigation::not_found(OutcomeCode::MalformedToken)
            );
            prop_assert_eq!(
                outcome.run.trace,
                vec![BootstrapState::Pending, BootstrapState::Validating, BootstrapState::Rejected]
            );
            prop_assert_eq!(exchange.calls(), 0);
            Ok(())
        })?;
    }

    /// Expired tokens are rejected locally, whatever their mode.
    #[test]
    fn prop_expired_token_never_calls_exchange(age in 0i64..86_400, mode in "[a-z]{1,8}") {
        let rt = test_runtime()?;
        rt.block_on(async {
            let exchange = CountingExchange::new(StaticExchange::granting("C9"));
            let pipeline = test_pipeline(&MockScanStore::new(), exchange.clone());

            // exp == now counts as expired.
            let claims = tokens::claims_with_mode(&mode, Some("C9"), NOW - age);
            let outcome = pipeline.resolve_preview(Some(&tokens::unsigned(&claims))).await;

            prop_assert_eq!(outcome.navigation, Navigation::not_found(OutcomeCode::ExpiredToken));
            prop_assert_eq!(exchange.calls(), 0);
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_preview_rejection_order() {
    let exchange = CountingExchange::new(StaticExchange::granting("C9"));
    let pipeline = test_pipeline(&MockScanStore::new(), exchange.clone());

    let outcome = pipeline.resolve_preview(None).await;
    assert_not_found(&outcome.navigation, OutcomeCode::MissingToken);

    let outcome = pipeline.resolve_preview(Some("only.two")).await;
    assert_not_found(&outcome.navigation, OutcomeCode::MalformedToken);

    let outcome = pipeline
        .resolve_preview(Some(&tokens::with_raw_payload("not json")))
        .await;
    assert_not_found(&outcome.navigation, OutcomeCode::MalformedToken);

    let live_wrong_mode = tokens::claims_with_mode("live", Some("C9"), NOW + 60);
    let outcome = pipeline
        .resolve_preview(Some(&tokens::unsigned(&live_wrong_mode)))
        .await;
    assert_not_found(&outcome.navigation, OutcomeCode::WrongMode);

    assert_eq!(exchange.calls(), 0);
}
