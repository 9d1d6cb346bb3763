//! Common test utilities for integration tests
//!
//! Shared fixtures for driving wired registries by hand.

use std::sync::Arc;

use eventual::domain::models::ReconciliationConfig;
use eventual::infrastructure::scheduling::ManualTrigger;
use eventual::services::Reconciliation;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Reconciliation settings with the same fail rate on both annotation gates.
#[allow(dead_code)]
pub fn reconciliation_config(target: u64, fail_every: u64) -> ReconciliationConfig {
    ReconciliationConfig {
        target_field_count: target,
        annotate_fail_every: fail_every,
        acknowledge_fail_every: fail_every,
        ..Default::default()
    }
}

/// Wire both registries onto a manual trigger.
#[allow(dead_code)]
pub fn wire_manual(config: &ReconciliationConfig) -> (Arc<ManualTrigger>, Reconciliation) {
    let trigger = Arc::new(ManualTrigger::new());
    let wiring = Reconciliation::wire(config, trigger.clone()).expect("Failed to wire registries");
    (trigger, wiring)
}

/// Step every trigger once per round, waiting for dispatched deliveries
/// between rounds, until the registries converge.
///
/// Returns the round convergence was observed in, or `None` if it wasn't
/// reached within `max_rounds`.
#[allow(dead_code)]
pub async fn drive_until_converged(
    trigger: &ManualTrigger,
    wiring: &Reconciliation,
    max_rounds: usize,
) -> Option<usize> {
    for round in 1..=max_rounds {
        trigger.tick_all().await;
        wiring.flush().await;
        if wiring.is_converged().await {
            return Some(round);
        }
    }
    None
}
