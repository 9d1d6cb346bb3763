mod common;

use std::collections::BTreeSet;

use proptest::prelude::*;

use common::{drive_until_converged, reconciliation_config, wire_manual};

struct RunSummary {
    converged_in: Option<usize>,
    field_ids: Vec<u64>,
    annotation_ids: Vec<u64>,
    settled: Vec<u64>,
    mismatched: usize,
}

fn run_to_convergence(target: u64, annotate_every: u64, ack_every: u64) -> RunSummary {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async move {
        let mut config = reconciliation_config(target, annotate_every);
        config.acknowledge_fail_every = ack_every;
        let (trigger, wiring) = wire_manual(&config);

        let max_rounds = usize::try_from(target).unwrap() * 4 + 20;
        let converged_in = drive_until_converged(&trigger, &wiring, max_rounds).await;

        let fields = wiring.fields().fields().await;
        let acknowledged = wiring.annotations().acknowledged_annotations().await;
        let mismatched = fields
            .iter()
            .filter(|f| f.annotation.as_ref().map(|a| a.id) != acknowledged.get(&f.id).map(|a| a.id))
            .count();

        RunSummary {
            converged_in,
            field_ids: fields.iter().map(|f| f.id).collect(),
            annotation_ids: acknowledged.values().map(|a| a.id).collect(),
            settled: wiring.settled_fields().await,
            mismatched,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: any fail rate of at least 2 converges within a bounded
    /// number of sweep rounds
    #[test]
    fn prop_unreliable_gates_converge(
        target in 1u64..20,
        annotate_every in 2u64..5,
        ack_every in 2u64..5,
    ) {
        let summary = run_to_convergence(target, annotate_every, ack_every);

        prop_assert!(summary.converged_in.is_some());
        let expected: Vec<u64> = (1..=target).collect();
        prop_assert_eq!(&summary.field_ids, &expected);
        prop_assert_eq!(&summary.settled, &expected);
        prop_assert_eq!(summary.mismatched, 0);
    }

    /// Property: annotation ids are minted once per field, densely from 1
    #[test]
    fn prop_annotation_ids_unique_and_dense(
        target in 1u64..20,
        fail_every in 2u64..5,
    ) {
        let summary = run_to_convergence(target, fail_every, fail_every);

        let ids: BTreeSet<u64> = summary.annotation_ids.iter().copied().collect();
        prop_assert_eq!(ids.len(), summary.annotation_ids.len());
        prop_assert_eq!(ids, (1..=target).collect::<BTreeSet<u64>>());
    }
}
