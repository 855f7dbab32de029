//! # Stream Aggregator
//!
//! Single pass over one or more index-aligned record streams. Each record
//! is classified into a [`ConditionKey`]; matched records feed that
//! condition's [`ConditionBucket`], unmatched records are counted and
//! skipped. Buckets are independent and keep arrival order.
//!
//! Three input shapes are supported:
//!
//! - **one hop** — a single source stream.
//! - **two hop, coded** — source stream paired with the relay stream; the
//!   charged transmissions are `tx_num + fwd_num` and the reference
//!   condition also yields per-hop channel-loss estimates.
//! - **two hop, baseline** — uncoded source, relay and destination streams;
//!   loss comes from the destination, transmissions are
//!   `tx_num + rx_num`.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::condition::{classify, ConditionKey};
use crate::config::StatsConfig;
use crate::error::{Error, Result};
use crate::record::MeasurementRecord;
use crate::retx::RetxHistogram;
use crate::two_hop::hop_loss;
use crate::window::{ChannelLossSeries, ChannelSample, ConditionBucket, Observation};

// ─── Report ─────────────────────────────────────────────────────────────────

/// Everything one aggregation pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub window_size: usize,
    pub reference_condition: ConditionKey,
    /// Buckets in legend order.
    pub buckets: BTreeMap<ConditionKey, ConditionBucket>,
    /// Transmissions per baseline attempt on hop one (the source).
    pub hop_one_retx: RetxHistogram,
    /// Forwards per baseline attempt on hop two (the relay).
    pub hop_two_retx: RetxHistogram,
    /// Records that matched a condition.
    pub matched: usize,
    /// Records skipped by the classifier.
    pub skipped: usize,
}

impl AggregateReport {
    pub fn bucket(&self, key: ConditionKey) -> Option<&ConditionBucket> {
        self.buckets.get(&key)
    }

    /// Channel-loss series of the reference condition, if it was seen.
    pub fn channel_loss(&self) -> Option<&ChannelLossSeries> {
        self.buckets
            .get(&self.reference_condition)
            .and_then(ConditionBucket::channel)
    }
}

// ─── Aggregator ─────────────────────────────────────────────────────────────

/// Accumulates records into per-condition windowed series.
pub struct StreamAggregator {
    window_size: usize,
    reference: ConditionKey,
    buckets: BTreeMap<ConditionKey, ConditionBucket>,
    hop_one_retx: RetxHistogram,
    hop_two_retx: RetxHistogram,
    matched: usize,
    skipped: usize,
}

impl StreamAggregator {
    /// Start an empty pass. The configuration is validated first.
    pub fn new(config: &StatsConfig) -> Result<Self> {
        config.validate()?;
        Ok(StreamAggregator {
            window_size: config.window_size,
            reference: config.reference_condition,
            buckets: BTreeMap::new(),
            hop_one_retx: RetxHistogram::new(),
            hop_two_retx: RetxHistogram::new(),
            matched: 0,
            skipped: 0,
        })
    }

    /// Classify a source record, counting it as skipped when it matches
    /// nothing. A record without a `type` is malformed, not skipped.
    fn match_record(
        &mut self,
        index: usize,
        record: &MeasurementRecord,
    ) -> Result<Option<ConditionKey>> {
        record.require_kind(index)?;
        match classify(record) {
            Some(key) => Ok(Some(key)),
            None => {
                trace!(
                    index,
                    kind = record.kind.as_deref().unwrap_or_default(),
                    redundancy = ?record.redundancy,
                    "record skipped"
                );
                self.skipped += 1;
                Ok(None)
            }
        }
    }

    fn feed(&mut self, key: ConditionKey, obs: Observation) {
        self.matched += 1;
        let window_size = self.window_size;
        self.buckets
            .entry(key)
            .or_insert_with(|| ConditionBucket::new(key, window_size))
            .observe(obs);
    }

    /// One-hop record: the transmission count is the source's `tx_num`.
    pub fn observe_one_hop(
        &mut self,
        index: usize,
        record: &MeasurementRecord,
    ) -> Result<Option<ConditionKey>> {
        let Some(key) = self.match_record(index, record)? else {
            return Ok(None);
        };
        let loss_rate = record.require_loss_rate(index)?;
        let tx = record.require_tx_num(index)?;

        if key == ConditionKey::Baseline {
            self.hop_one_retx.record(tx);
        }
        let channel = (key == self.reference).then_some(ChannelSample {
            total: loss_rate,
            hops: None,
        });
        self.feed(
            key,
            Observation {
                lost: loss_rate > 0.0,
                tx: tx as f64,
                channel,
            },
        );
        Ok(Some(key))
    }

    /// Coded two-hop record paired with the relay record at the same index.
    /// Baseline records in the coded stream are skipped; the uncoded run is
    /// read from its own streams by [`observe_two_hop_baseline`].
    ///
    /// [`observe_two_hop_baseline`]: StreamAggregator::observe_two_hop_baseline
    pub fn observe_two_hop(
        &mut self,
        index: usize,
        src: &MeasurementRecord,
        relay: Option<&MeasurementRecord>,
    ) -> Result<Option<ConditionKey>> {
        let Some(key) = self.match_record(index, src)? else {
            return Ok(None);
        };
        if key == ConditionKey::Baseline {
            trace!(index, "baseline record in coded stream skipped");
            self.skipped += 1;
            return Ok(None);
        }
        let relay = relay.ok_or(Error::UnpairedRecord {
            index,
            stream: "relay",
        })?;
        let loss_rate = src.require_loss_rate(index)?;
        let tx = src.require_tx_num(index)?;
        let fwd = relay.require_fwd_num(index)?;

        let channel = if key == self.reference {
            let gen_size = src.require_gen_size(index)?;
            let hops = hop_loss(tx, fwd, loss_rate, gen_size)?;
            Some(ChannelSample {
                total: loss_rate,
                hops: Some((hops.hop_one, hops.hop_two)),
            })
        } else {
            None
        };
        self.feed(
            key,
            Observation {
                lost: loss_rate > 0.0,
                tx: tx as f64 + fwd as f64,
                channel,
            },
        );
        Ok(Some(key))
    }

    /// Uncoded two-hop attempt from index-aligned source, relay and
    /// destination records. Only `no_coding` source records count.
    pub fn observe_two_hop_baseline(
        &mut self,
        index: usize,
        src: &MeasurementRecord,
        relay: Option<&MeasurementRecord>,
        dst: Option<&MeasurementRecord>,
    ) -> Result<bool> {
        let Some(key) = self.match_record(index, src)? else {
            return Ok(false);
        };
        if key != ConditionKey::Baseline {
            trace!(index, condition = %key.slug(), "coded record in baseline stream skipped");
            self.skipped += 1;
            return Ok(false);
        }
        let relay = relay.ok_or(Error::UnpairedRecord {
            index,
            stream: "relay",
        })?;
        let dst = dst.ok_or(Error::UnpairedRecord {
            index,
            stream: "destination",
        })?;
        let tx = src.require_tx_num(index)?;
        let fwd = relay.require_fwd_num(index)?;
        let dst_loss = dst.require_loss_rate(index)?;
        let rx = dst.require_rx_num(index)?;

        self.hop_one_retx.record(tx);
        self.hop_two_retx.record(fwd);
        let channel = (key == self.reference).then_some(ChannelSample {
            total: dst_loss,
            hops: None,
        });
        self.feed(
            key,
            Observation {
                lost: dst_loss != 0.0,
                tx: tx as f64 + rx as f64,
                channel,
            },
        );
        Ok(true)
    }

    pub fn finish(self) -> AggregateReport {
        debug!(
            matched = self.matched,
            skipped = self.skipped,
            conditions = self.buckets.len(),
            "aggregation finished"
        );
        AggregateReport {
            window_size: self.window_size,
            reference_condition: self.reference,
            buckets: self.buckets,
            hop_one_retx: self.hop_one_retx,
            hop_two_retx: self.hop_two_retx,
            matched: self.matched,
            skipped: self.skipped,
        }
    }
}

// ─── Batch Entry Points ─────────────────────────────────────────────────────

/// Aggregate a one-hop dump.
pub fn aggregate_one_hop(
    records: &[MeasurementRecord],
    config: &StatsConfig,
) -> Result<AggregateReport> {
    let mut agg = StreamAggregator::new(config)?;
    for (index, record) in records.iter().enumerate() {
        agg.observe_one_hop(index, record)?;
    }
    Ok(agg.finish())
}

/// The five dumps of a two-hop measurement run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoHopStreams<'a> {
    /// Coded runs, source side.
    pub coded_src: &'a [MeasurementRecord],
    /// Coded runs, relay side.
    pub coded_relay: &'a [MeasurementRecord],
    /// Uncoded run, source side.
    pub baseline_src: &'a [MeasurementRecord],
    /// Uncoded run, relay side.
    pub baseline_relay: &'a [MeasurementRecord],
    /// Uncoded run, destination side.
    pub baseline_dst: &'a [MeasurementRecord],
}

/// Aggregate a two-hop run: coded streams first, then the baseline.
pub fn aggregate_two_hop(
    streams: TwoHopStreams<'_>,
    config: &StatsConfig,
) -> Result<AggregateReport> {
    let mut agg = StreamAggregator::new(config)?;
    for (index, src) in streams.coded_src.iter().enumerate() {
        agg.observe_two_hop(index, src, streams.coded_relay.get(index))?;
    }
    for (index, src) in streams.baseline_src.iter().enumerate() {
        agg.observe_two_hop_baseline(
            index,
            src,
            streams.baseline_relay.get(index),
            streams.baseline_dst.get(index),
        )?;
    }
    Ok(agg.finish())
}
