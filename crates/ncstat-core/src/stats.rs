//! # Sample Statistics
//!
//! Summary statistics over sequences of windowed means: arithmetic mean,
//! sample standard deviation, Student-t confidence intervals, box-plot
//! percentiles and the transmission-to-energy conversion.

use serde::Serialize;

use crate::error::{Error, Result};

/// Student-t critical value used for all published intervals.
pub const DEFAULT_T_CRITICAL: f64 = 2.0211;

/// Energy units per transmission.
pub const DEFAULT_ENERGY_FACTOR: f64 = 4.0;

/// Whisker percentiles of the published two-hop box plots.
pub const DEFAULT_WHISKERS: (f64, f64) = (12.5, 87.5);

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

/// Sample standard deviation (Bessel-corrected, ddof = 1).
pub fn sample_std_dev(samples: &[f64]) -> Result<f64> {
    let n = samples.len();
    if n < 2 {
        return Err(Error::Domain(format!(
            "standard deviation needs at least 2 samples, got {n}"
        )));
    }
    let m = samples.iter().sum::<f64>() / n as f64;
    let ss: f64 = samples.iter().map(|x| (x - m) * (x - m)).sum();
    Ok((ss / (n - 1) as f64).sqrt())
}

// ─── Confidence Interval ────────────────────────────────────────────────────

/// Symmetric parametric interval around a sample mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub mean: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn half_width(&self) -> f64 {
        self.upper - self.mean
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// `mean ± t · sd / √n` over `samples`.
///
/// `t` is taken as given; it is not re-derived from the sample count.
pub fn confidence_interval(samples: &[f64], t: f64) -> Result<ConfidenceInterval> {
    if !t.is_finite() || t < 0.0 {
        return Err(Error::Domain(format!("invalid critical value {t}")));
    }
    let sd = sample_std_dev(samples)?;
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let margin = t * sd / n.sqrt();
    Ok(ConfidenceInterval {
        lower: mean - margin,
        mean,
        upper: mean + margin,
    })
}

// ─── Percentiles ────────────────────────────────────────────────────────────

/// `p`-th percentile (0..=100) with linear interpolation between the
/// closest ranks. `None` for an empty slice or `p` out of range.
pub fn percentile(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(percentile_sorted(&sorted, p))
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Five-number box summary with percentile whiskers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    /// Smallest sample at or above the lower whisker percentile.
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Largest sample at or below the upper whisker percentile.
    pub whisker_high: f64,
    /// Samples beyond either whisker.
    pub outliers: usize,
}

/// Quartiles, median and whiskers of `samples`. Whisker ends snap to the
/// most extreme samples inside the `whiskers` percentile pair, and never
/// fall inside the box.
pub fn box_stats(samples: &[f64], whiskers: (f64, f64)) -> Option<BoxStats> {
    let (low_p, high_p) = whiskers;
    let ordered = (0.0..=100.0).contains(&low_p) && (low_p..=100.0).contains(&high_p);
    if samples.is_empty() || !ordered {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile_sorted(&sorted, 25.0);
    let median = percentile_sorted(&sorted, 50.0);
    let q3 = percentile_sorted(&sorted, 75.0);
    let low_cut = percentile_sorted(&sorted, low_p);
    let high_cut = percentile_sorted(&sorted, high_p);

    let whisker_low = sorted
        .iter()
        .copied()
        .find(|&x| x >= low_cut)
        .filter(|&x| x <= q1)
        .unwrap_or(q1);
    let whisker_high = sorted
        .iter()
        .rev()
        .copied()
        .find(|&x| x <= high_cut)
        .filter(|&x| x >= q3)
        .unwrap_or(q3);
    let outliers = sorted
        .iter()
        .filter(|&&x| x < whisker_low || x > whisker_high)
        .count();

    Some(BoxStats {
        whisker_low,
        q1,
        median,
        q3,
        whisker_high,
        outliers,
    })
}

// ─── Energy ─────────────────────────────────────────────────────────────────

/// Convert a transmission count into energy: `(tx + extra_tx) · factor`.
pub fn derived_energy(tx_value: f64, extra_tx: f64, factor: f64) -> f64 {
    (tx_value + extra_tx) * factor
}

/// Confidence interval of the energy derived from each transmission mean.
pub fn energy_interval(
    tx_means: &[f64],
    extra_tx: f64,
    factor: f64,
    t: f64,
) -> Result<ConfidenceInterval> {
    let energy: Vec<f64> = tx_means
        .iter()
        .map(|&tx| derived_energy(tx, extra_tx, factor))
        .collect();
    confidence_interval(&energy, t)
}

/// Mean channel-loss estimate as a whole percentage, truncated toward zero.
/// Negative hop estimates are reported as they are.
pub fn channel_loss_percent(estimates: &[f64]) -> Result<i32> {
    let m = mean(estimates)
        .ok_or_else(|| Error::Domain("no channel-loss estimates".to_string()))?;
    if !m.is_finite() {
        return Err(Error::Domain(format!("non-finite channel-loss mean {m}")));
    }
    Ok((m * 100.0).trunc() as i32)
}
