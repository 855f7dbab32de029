//! # Disjoint Window Averaging
//!
//! Samples are collected into consecutive, non-overlapping windows of a
//! fixed size. When a window fills, its arithmetic mean is appended to
//! the output series and the window starts over empty. A trailing window
//! that never fills is never emitted.

use tracing::debug;

use crate::condition::ConditionKey;

/// Default number of records per window.
pub const DEFAULT_WINDOW_SIZE: usize = 50;

// ─── Windowed Mean ──────────────────────────────────────────────────────────

/// Fill/flush accumulator for one numeric series.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedMean {
    size: usize,
    window: Vec<f64>,
    averages: Vec<f64>,
}

impl WindowedMean {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "window size must be positive");
        WindowedMean {
            size,
            window: Vec::with_capacity(size),
            averages: Vec::new(),
        }
    }

    /// Add a sample. Returns the window mean when this sample completes
    /// a window.
    pub fn push(&mut self, sample: f64) -> Option<f64> {
        self.window.push(sample);
        if self.window.len() < self.size {
            return None;
        }
        let avg = self.window.iter().sum::<f64>() / self.size as f64;
        self.averages.push(avg);
        self.window.clear();
        Some(avg)
    }

    /// Completed window means, in arrival order.
    pub fn averages(&self) -> &[f64] {
        &self.averages
    }

    /// Samples waiting in the current, incomplete window.
    pub fn pending(&self) -> usize {
        self.window.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

// ─── Condition Bucket ───────────────────────────────────────────────────────

/// One record's contribution to a bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Whether the generation was lost (`loss_rate > 0`).
    pub lost: bool,
    /// Transmission count charged to this generation.
    pub tx: f64,
    /// Channel-loss estimates, only for the reference condition.
    pub channel: Option<ChannelSample>,
}

/// Channel-loss estimates carried by one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSample {
    /// End-to-end estimate as logged by the source.
    pub total: f64,
    /// Per-hop estimates (hop one, hop two); two-hop runs only.
    pub hops: Option<(f64, f64)>,
}

/// Channel-loss series, flushed in lockstep with the loss window.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLossSeries {
    pub total: WindowedMean,
    pub hop_one: WindowedMean,
    pub hop_two: WindowedMean,
}

impl ChannelLossSeries {
    fn new(size: usize) -> Self {
        ChannelLossSeries {
            total: WindowedMean::new(size),
            hop_one: WindowedMean::new(size),
            hop_two: WindowedMean::new(size),
        }
    }
}

/// Per-condition accumulator holding the parallel windowed series.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionBucket {
    key: ConditionKey,
    loss: WindowedMean,
    tx: WindowedMean,
    channel: Option<ChannelLossSeries>,
    observed: usize,
}

impl ConditionBucket {
    pub fn new(key: ConditionKey, window_size: usize) -> Self {
        ConditionBucket {
            key,
            loss: WindowedMean::new(window_size),
            tx: WindowedMean::new(window_size),
            channel: None,
            observed: 0,
        }
    }

    /// Feed one record. Returns `true` when the record closed a window.
    pub fn observe(&mut self, obs: Observation) -> bool {
        self.observed += 1;
        let indicator = if obs.lost { 1.0 } else { 0.0 };
        let loss_avg = self.loss.push(indicator);
        let tx_avg = self.tx.push(obs.tx);

        if let Some(sample) = obs.channel {
            let size = self.loss.size();
            let channel = self
                .channel
                .get_or_insert_with(|| ChannelLossSeries::new(size));
            channel.total.push(sample.total);
            if let Some((one, two)) = sample.hops {
                channel.hop_one.push(one);
                channel.hop_two.push(two);
            }
        }

        match (loss_avg, tx_avg) {
            (Some(loss), Some(tx)) => {
                debug!(
                    condition = %self.key.slug(),
                    window = self.loss.averages().len(),
                    loss,
                    tx,
                    "window flushed"
                );
                true
            }
            _ => false,
        }
    }

    pub fn key(&self) -> ConditionKey {
        self.key
    }

    /// Windowed loss-indicator means.
    pub fn loss_averages(&self) -> &[f64] {
        self.loss.averages()
    }

    /// Windowed transmission-count means.
    pub fn tx_averages(&self) -> &[f64] {
        self.tx.averages()
    }

    pub fn channel(&self) -> Option<&ChannelLossSeries> {
        self.channel.as_ref()
    }

    /// Records seen by this bucket.
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Records buffered in the incomplete trailing window.
    pub fn pending(&self) -> usize {
        self.loss.pending()
    }

    pub fn window_size(&self) -> usize {
        self.loss.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── WindowedMean Tests ─────────────────────────────────────────────

    #[test]
    fn emits_once_per_full_window() {
        let mut w = WindowedMean::new(3);
        assert_eq!(w.push(1.0), None);
        assert_eq!(w.push(2.0), None);
        assert_eq!(w.push(3.0), Some(2.0));
        assert_eq!(w.pending(), 0);
        assert_eq!(w.push(10.0), None);
        assert_eq!(w.averages(), &[2.0]);
        assert_eq!(w.pending(), 1);
    }

    #[test]
    fn windows_do_not_overlap() {
        let mut w = WindowedMean::new(2);
        for x in [1.0, 3.0, 5.0, 7.0] {
            w.push(x);
        }
        assert_eq!(w.averages(), &[2.0, 6.0]);
    }

    #[test]
    fn window_of_one_passes_samples_through() {
        let mut w = WindowedMean::new(1);
        assert_eq!(w.push(4.5), Some(4.5));
        assert_eq!(w.push(0.5), Some(0.5));
        assert_eq!(w.averages(), &[4.5, 0.5]);
    }

    #[test]
    #[should_panic(expected = "window size must be positive")]
    fn zero_window_rejected() {
        WindowedMean::new(0);
    }

    // ─── ConditionBucket Tests ──────────────────────────────────────────

    fn obs(lost: bool, tx: f64) -> Observation {
        Observation {
            lost,
            tx,
            channel: None,
        }
    }

    #[test]
    fn bucket_flushes_loss_and_tx_together() {
        let mut bucket = ConditionBucket::new(ConditionKey::Baseline, 4);
        assert!(!bucket.observe(obs(false, 1.0)));
        assert!(!bucket.observe(obs(true, 2.0)));
        assert!(!bucket.observe(obs(false, 1.0)));
        assert!(bucket.observe(obs(false, 4.0)));
        assert_eq!(bucket.loss_averages(), &[0.25]);
        assert_eq!(bucket.tx_averages(), &[2.0]);
        assert_eq!(bucket.pending(), 0);
        assert_eq!(bucket.observed(), 4);
    }

    #[test]
    fn bucket_without_channel_samples_has_no_channel_series() {
        let mut bucket = ConditionBucket::new(ConditionKey::Baseline, 2);
        bucket.observe(obs(false, 1.0));
        assert!(bucket.channel().is_none());
    }

    #[test]
    fn channel_series_flush_in_lockstep() {
        let mut bucket = ConditionBucket::new(ConditionKey::Baseline, 2);
        for (total, one, two) in [(0.2, 0.1, 0.1), (0.4, 0.3, 0.1)] {
            bucket.observe(Observation {
                lost: false,
                tx: 1.0,
                channel: Some(ChannelSample {
                    total,
                    hops: Some((one, two)),
                }),
            });
        }
        let channel = bucket.channel().unwrap();
        assert!((channel.total.averages()[0] - 0.3).abs() < 1e-12);
        assert!((channel.hop_one.averages()[0] - 0.2).abs() < 1e-12);
        assert!((channel.hop_two.averages()[0] - 0.1).abs() < 1e-12);
        assert_eq!(bucket.loss_averages().len(), 1);
    }

    #[test]
    fn one_hop_channel_sample_leaves_hop_series_empty() {
        let mut bucket = ConditionBucket::new(ConditionKey::Baseline, 1);
        bucket.observe(Observation {
            lost: true,
            tx: 2.0,
            channel: Some(ChannelSample {
                total: 0.3,
                hops: None,
            }),
        });
        let channel = bucket.channel().unwrap();
        assert_eq!(channel.total.averages(), &[0.3]);
        assert!(channel.hop_one.averages().is_empty());
        assert!(channel.hop_two.averages().is_empty());
    }
}
