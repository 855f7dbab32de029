//! Retransmission-count distributions for the uncoded baseline.

use std::collections::BTreeMap;

use serde::Serialize;

/// Counts of how many attempts needed exactly `k` transmissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetxHistogram {
    counts: BTreeMap<u32, u64>,
    total: u64,
}

impl RetxHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, transmissions: u32) {
        *self.counts.entry(transmissions).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, transmissions: u32) -> u64 {
        self.counts.get(&transmissions).copied().unwrap_or(0)
    }

    /// Fraction of attempts per transmission count, sorted by count.
    pub fn distribution(&self) -> RetxDistribution {
        let shares = if self.total == 0 {
            Vec::new()
        } else {
            self.counts
                .iter()
                .map(|(&k, &c)| (k, c as f64 / self.total as f64))
                .collect()
        };
        RetxDistribution { shares }
    }
}

/// Normalised histogram: `(transmissions, share)` pairs in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetxDistribution {
    pub shares: Vec<(u32, f64)>,
}

impl RetxDistribution {
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}
