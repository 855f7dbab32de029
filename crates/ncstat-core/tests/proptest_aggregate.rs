//! Property-based tests for windowed aggregation and confidence intervals.

use ncstat_core::condition::ConditionKey;
use ncstat_core::stats::confidence_interval;
use ncstat_core::{aggregate_one_hop, MeasurementRecord, StatsConfig};
use proptest::prelude::*;

const KINDS: [&str; 5] = ["no_coding", "block_full", "block_sparse", "block_recode", "other"];
const REDUNDANCY: [f64; 5] = [0.0, 0.5, 0.75, 1.0, 0.25];

fn arb_record() -> impl Strategy<Value = MeasurementRecord> {
    (0usize..KINDS.len(), 0usize..REDUNDANCY.len(), 0u32..4, 1u32..20).prop_map(
        |(kind, redundancy, loss_steps, tx_num)| MeasurementRecord {
            kind: Some(KINDS[kind].to_string()),
            redundancy: Some(REDUNDANCY[redundancy]),
            loss_rate: Some(loss_steps as f64 * 0.25),
            tx_num: Some(tx_num),
            gen_size: Some(4),
            ..Default::default()
        },
    )
}

// ─── Window Accounting ──────────────────────────────────────────────────────

proptest! {
    /// Every matched record is either inside a completed window or pending,
    /// and fewer than W records are ever pending.
    #[test]
    fn windows_account_for_every_matched_record(
        records in prop::collection::vec(arb_record(), 0..400),
        window_size in 1usize..60,
    ) {
        let config = StatsConfig { window_size, ..Default::default() };
        let report = aggregate_one_hop(&records, &config).unwrap();

        let mut matched = 0;
        for bucket in report.buckets.values() {
            let windows = bucket.loss_averages().len();
            prop_assert_eq!(windows, bucket.tx_averages().len());
            prop_assert!(bucket.pending() < window_size);
            prop_assert_eq!(windows * window_size + bucket.pending(), bucket.observed());
            matched += bucket.observed();
        }
        prop_assert_eq!(matched, report.matched);
        prop_assert_eq!(report.matched + report.skipped, records.len());
    }
}

// ─── Determinism ────────────────────────────────────────────────────────────

proptest! {
    /// Aggregating the same input twice gives the same report.
    #[test]
    fn aggregation_is_deterministic(
        records in prop::collection::vec(arb_record(), 0..300),
        window_size in 1usize..20,
    ) {
        let config = StatsConfig { window_size, ..Default::default() };
        let first = aggregate_one_hop(&records, &config).unwrap();
        let second = aggregate_one_hop(&records, &config).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ─── Loss Means Are Probabilities ───────────────────────────────────────────

proptest! {
    #[test]
    fn loss_means_stay_in_unit_interval(
        records in prop::collection::vec(arb_record(), 0..300),
        window_size in 1usize..20,
    ) {
        let config = StatsConfig { window_size, ..Default::default() };
        let report = aggregate_one_hop(&records, &config).unwrap();
        for bucket in report.buckets.values() {
            for &m in bucket.loss_averages() {
                prop_assert!((0.0..=1.0).contains(&m), "loss mean {} out of range", m);
            }
        }
        if let Some(baseline) = report.bucket(ConditionKey::Baseline) {
            prop_assert!(baseline.channel().is_none());
        }
    }
}

// ─── Confidence Interval Bounds ─────────────────────────────────────────────

proptest! {
    /// `lower <= mean <= upper` for any sample set of size >= 2.
    #[test]
    fn interval_brackets_mean(
        samples in prop::collection::vec(-1.0e6f64..1.0e6, 2..200),
        t in 0.0f64..10.0,
    ) {
        let ci = confidence_interval(&samples, t).unwrap();
        prop_assert!(ci.lower <= ci.mean);
        prop_assert!(ci.mean <= ci.upper);
    }

    #[test]
    fn interval_rejects_fewer_than_two(
        samples in prop::collection::vec(-1.0e6f64..1.0e6, 0..2),
    ) {
        prop_assert!(confidence_interval(&samples, 2.0211).is_err());
    }
}
