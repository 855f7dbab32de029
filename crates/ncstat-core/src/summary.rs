//! # Run Summaries
//!
//! Presentation-ready view of an [`AggregateReport`]: per-condition means,
//! confidence intervals, box summaries and energy figures, plus the channel-loss series
//! and retransmission distributions. Everything here is `Serialize` so a
//! plotting layer can consume it as JSON.
//!
//! Conditions with fewer than two windows get `None` intervals; this is
//! the only place a [`Error::Domain`](crate::Error::Domain) is absorbed.

use serde::Serialize;
use tracing::debug;

use crate::aggregator::AggregateReport;
use crate::condition::ConditionKey;
use crate::config::StatsConfig;
use crate::retx::RetxDistribution;
use crate::stats::{
    box_stats, channel_loss_percent, confidence_interval, derived_energy, energy_interval, mean,
    BoxStats, ConfidenceInterval,
};
use crate::window::{ConditionBucket, WindowedMean};

/// Statistics for one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionSummary {
    pub condition: ConditionKey,
    pub label: String,
    /// Completed windows.
    pub windows: usize,
    /// Records left in the incomplete trailing window.
    pub pending: usize,
    pub loss_mean: Option<f64>,
    pub tx_mean: Option<f64>,
    pub loss_ci: Option<ConfidenceInterval>,
    pub tx_ci: Option<ConfidenceInterval>,
    pub loss_box: Option<BoxStats>,
    pub tx_box: Option<BoxStats>,
    pub extra_tx: f64,
    /// Energy at the mean transmission count.
    pub energy: Option<f64>,
    pub energy_ci: Option<ConfidenceInterval>,
    pub loss_series: Vec<f64>,
    pub tx_series: Vec<f64>,
}

/// One channel-loss series with its average in whole percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSeriesSummary {
    pub series: Vec<f64>,
    pub percent: Option<i32>,
}

impl ChannelSeriesSummary {
    fn from_windowed(w: &WindowedMean) -> Self {
        ChannelSeriesSummary {
            series: w.averages().to_vec(),
            percent: channel_loss_percent(w.averages()).ok(),
        }
    }
}

/// Channel-loss estimates of the reference condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelLossSummary {
    pub condition: ConditionKey,
    pub total: ChannelSeriesSummary,
    pub hop_one: ChannelSeriesSummary,
    pub hop_two: ChannelSeriesSummary,
}

/// Everything a chart needs from one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub window_size: usize,
    pub t_critical: f64,
    pub whiskers: (f64, f64),
    pub energy_factor: f64,
    pub matched: usize,
    pub skipped: usize,
    pub conditions: Vec<ConditionSummary>,
    pub channel_loss: Option<ChannelLossSummary>,
    pub hop_one_retx: RetxDistribution,
    pub hop_two_retx: RetxDistribution,
}

impl RunSummary {
    pub fn condition(&self, key: ConditionKey) -> Option<&ConditionSummary> {
        self.conditions.iter().find(|c| c.condition == key)
    }
}

fn interval_or_none(
    key: ConditionKey,
    what: &'static str,
    result: crate::Result<ConfidenceInterval>,
) -> Option<ConfidenceInterval> {
    match result {
        Ok(ci) => Some(ci),
        Err(e) => {
            debug!(condition = %key.slug(), what, error = %e, "no confidence interval");
            None
        }
    }
}

/// Summarise one bucket.
pub fn summarize_condition(bucket: &ConditionBucket, config: &StatsConfig) -> ConditionSummary {
    let key = bucket.key();
    let loss = bucket.loss_averages();
    let tx = bucket.tx_averages();
    let extra_tx = config.extra_tx(key);
    let tx_mean = mean(tx);

    ConditionSummary {
        condition: key,
        label: key.label(config.gen_size),
        windows: loss.len(),
        pending: bucket.pending(),
        loss_mean: mean(loss),
        tx_mean,
        loss_ci: interval_or_none(key, "loss", confidence_interval(loss, config.t_critical)),
        tx_ci: interval_or_none(key, "tx", confidence_interval(tx, config.t_critical)),
        loss_box: box_stats(loss, config.whiskers),
        tx_box: box_stats(tx, config.whiskers),
        extra_tx,
        energy: tx_mean.map(|m| derived_energy(m, extra_tx, config.energy_factor)),
        energy_ci: interval_or_none(
            key,
            "energy",
            energy_interval(tx, extra_tx, config.energy_factor, config.t_critical),
        ),
        loss_series: loss.to_vec(),
        tx_series: tx.to_vec(),
    }
}

/// Summarise a whole report.
pub fn summarize(report: &AggregateReport, config: &StatsConfig) -> RunSummary {
    let conditions = report
        .buckets
        .values()
        .map(|bucket| summarize_condition(bucket, config))
        .collect();

    let channel_loss = report.channel_loss().map(|c| ChannelLossSummary {
        condition: report.reference_condition,
        total: ChannelSeriesSummary::from_windowed(&c.total),
        hop_one: ChannelSeriesSummary::from_windowed(&c.hop_one),
        hop_two: ChannelSeriesSummary::from_windowed(&c.hop_two),
    });

    RunSummary {
        window_size: report.window_size,
        t_critical: config.t_critical,
        whiskers: config.whiskers,
        energy_factor: config.energy_factor,
        matched: report.matched,
        skipped: report.skipped,
        conditions,
        channel_loss,
        hop_one_retx: report.hop_one_retx.distribution(),
        hop_two_retx: report.hop_two_retx.distribution(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate_one_hop;
    use crate::condition::{Redundancy, Scheme};
    use crate::record::MeasurementRecord;

    fn record(
        kind: &str,
        redundancy: Option<f64>,
        loss_rate: f64,
        tx_num: u32,
    ) -> MeasurementRecord {
        MeasurementRecord {
            kind: Some(kind.into()),
            redundancy,
            loss_rate: Some(loss_rate),
            tx_num: Some(tx_num),
            gen_size: Some(4),
            ..Default::default()
        }
    }

    fn small_window() -> StatsConfig {
        StatsConfig {
            window_size: 2,
            ..Default::default()
        }
    }

    #[test]
    fn single_window_has_no_interval() {
        let records = vec![record("no_coding", None, 0.0, 1); 3];
        let config = small_window();
        let report = aggregate_one_hop(&records, &config).unwrap();
        let summary = summarize(&report, &config);
        let baseline = summary.condition(ConditionKey::Baseline).unwrap();
        assert_eq!(baseline.windows, 1);
        assert_eq!(baseline.pending, 1);
        assert_eq!(baseline.tx_mean, Some(1.0));
        assert!(baseline.loss_ci.is_none());
        assert!(baseline.tx_ci.is_none());
        assert!(baseline.energy_ci.is_none());
        assert_eq!(baseline.energy, Some(4.0));
    }

    #[test]
    fn energy_uses_condition_calibration() {
        let key = ConditionKey::Coded(Scheme::Full, Redundancy::R50);
        let records = vec![
            record("block_full", Some(0.5), 0.0, 6),
            record("block_full", Some(0.5), 0.0, 6),
            record("block_full", Some(0.5), 0.0, 8),
            record("block_full", Some(0.5), 0.0, 8),
        ];
        let config = small_window();
        let report = aggregate_one_hop(&records, &config).unwrap();
        let summary = summarize(&report, &config);
        let nc = summary.condition(key).unwrap();
        assert_eq!(nc.label, "NC 4+2");
        assert_eq!(nc.tx_series, vec![6.0, 8.0]);
        assert_eq!(nc.extra_tx, 0.025);
        assert!((nc.energy.unwrap() - (7.0 + 0.025) * 4.0).abs() < 1e-9);
        let energy_ci = nc.energy_ci.unwrap();
        assert!((energy_ci.mean - nc.energy.unwrap()).abs() < 1e-9);
        let tx_ci = nc.tx_ci.unwrap();
        assert!((energy_ci.half_width() - 4.0 * tx_ci.half_width()).abs() < 1e-9);
    }

    #[test]
    fn conditions_listed_in_legend_order() {
        let records = vec![
            record("block_recode", Some(1.0), 0.0, 9),
            record("no_coding", None, 0.0, 1),
            record("block_full", Some(0.0), 0.0, 4),
        ];
        let config = StatsConfig {
            window_size: 1,
            ..Default::default()
        };
        let report = aggregate_one_hop(&records, &config).unwrap();
        let summary = summarize(&report, &config);
        let labels: Vec<&str> = summary.conditions.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["OT ARQ", "NC 4+0", "RNC 4+4"]);
    }

    #[test]
    fn channel_loss_percent_reported() {
        let records = vec![
            record("block_full", Some(0.0), 0.3, 5),
            record("block_full", Some(0.0), 0.35, 5),
        ];
        let config = StatsConfig {
            window_size: 1,
            ..Default::default()
        };
        let report = aggregate_one_hop(&records, &config).unwrap();
        let summary = summarize(&report, &config);
        let channel = summary.channel_loss.unwrap();
        assert_eq!(channel.total.percent, Some(32));
        assert_eq!(channel.hop_one.percent, None);
    }

    #[test]
    fn box_summary_follows_configured_whiskers() {
        let mut records = Vec::new();
        for tx in [1, 1, 2, 2, 3, 3, 4, 4, 9, 9] {
            records.push(record("no_coding", None, 0.0, tx));
        }
        let config = StatsConfig {
            whiskers: (0.0, 100.0),
            ..small_window()
        };
        let report = aggregate_one_hop(&records, &config).unwrap();
        let summary = summarize(&report, &config);
        let baseline = summary.condition(ConditionKey::Baseline).unwrap();
        let tx_box = baseline.tx_box.unwrap();
        assert_eq!(tx_box.median, 3.0);
        assert_eq!((tx_box.whisker_low, tx_box.whisker_high), (1.0, 9.0));
        assert_eq!(tx_box.outliers, 0);
        assert_eq!(baseline.loss_box.unwrap().median, 0.0);
        assert_eq!(summary.whiskers, (0.0, 100.0));
    }

    #[test]
    fn summary_serializes_condition_slugs() {
        let records = vec![record("no_coding", None, 0.0, 1); 2];
        let config = small_window();
        let report = aggregate_one_hop(&records, &config).unwrap();
        let json = serde_json::to_string(&summarize(&report, &config)).unwrap();
        assert!(json.contains("\"condition\":\"baseline\""));
        assert!(json.contains("\"label\":\"OT ARQ\""));
        assert!(json.contains("\"window_size\":2"));
    }
}
