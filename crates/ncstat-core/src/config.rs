use std::collections::BTreeMap;

use serde::Deserialize;

use crate::condition::{ConditionKey, Redundancy, Scheme};
use crate::error::{Error, Result};
use crate::stats::{DEFAULT_ENERGY_FACTOR, DEFAULT_T_CRITICAL, DEFAULT_WHISKERS};
use crate::window::DEFAULT_WINDOW_SIZE;

pub const CONFIG_VERSION: u32 = 1;

/// Generation size of the published runs, used for legend labels.
pub const DEFAULT_GEN_SIZE: u32 = 4;

/// Empirical extra transmissions per condition, in legend order.
const DEFAULT_EXTRA_TX: [f64; 11] = [
    0.0, 0.0, 0.025, 0.027, 0.030, 0.022, 0.023, 0.025, 0.040, 0.046, 0.052,
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatsConfigInput {
    pub version: u32,
    pub aggregation: AggregationConfigInput,
    pub energy: EnergyConfigInput,
    pub gen_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AggregationConfigInput {
    pub window_size: Option<usize>,
    pub t_critical: Option<f64>,
    pub reference_condition: Option<String>,
    /// Lower and upper whisker percentiles for box summaries.
    pub whiskers: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnergyConfigInput {
    pub factor: Option<f64>,
    /// Condition slug → extra transmissions. Merged over the defaults.
    pub extra_tx: BTreeMap<String, f64>,
}

/// Resolved, validated aggregation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsConfig {
    pub version: u32,
    /// Records per disjoint window.
    pub window_size: usize,
    /// Student-t critical value for confidence intervals.
    pub t_critical: f64,
    /// Condition whose records also feed the channel-loss series.
    pub reference_condition: ConditionKey,
    /// Whisker percentiles `(low, high)` of the loss/tx box summaries.
    pub whiskers: (f64, f64),
    /// Energy units per transmission.
    pub energy_factor: f64,
    pub extra_tx: BTreeMap<ConditionKey, f64>,
    pub gen_size: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            window_size: DEFAULT_WINDOW_SIZE,
            t_critical: DEFAULT_T_CRITICAL,
            reference_condition: ConditionKey::Coded(Scheme::Full, Redundancy::R0),
            whiskers: DEFAULT_WHISKERS,
            energy_factor: DEFAULT_ENERGY_FACTOR,
            extra_tx: ConditionKey::ALL
                .into_iter()
                .zip(DEFAULT_EXTRA_TX)
                .collect(),
            gen_size: DEFAULT_GEN_SIZE,
        }
    }
}

impl StatsConfigInput {
    pub fn resolve(self) -> Result<StatsConfig> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(Error::Config(format!(
                "unsupported config version {version}"
            )));
        }

        let defaults = StatsConfig::default();

        let window_size = self
            .aggregation
            .window_size
            .unwrap_or(defaults.window_size);
        let t_critical = self.aggregation.t_critical.unwrap_or(defaults.t_critical);
        let reference_condition = match self.aggregation.reference_condition {
            Some(slug) => ConditionKey::from_slug(slug.trim()).ok_or_else(|| {
                Error::Config(format!("unknown reference condition `{slug}`"))
            })?,
            None => defaults.reference_condition,
        };
        let whiskers = self
            .aggregation
            .whiskers
            .map_or(defaults.whiskers, |[low, high]| (low, high));
        let energy_factor = self.energy.factor.unwrap_or(defaults.energy_factor);

        let mut extra_tx = defaults.extra_tx;
        for (slug, value) in self.energy.extra_tx {
            let key = ConditionKey::from_slug(slug.trim())
                .ok_or_else(|| Error::Config(format!("unknown condition `{slug}` in extra_tx")))?;
            if !value.is_finite() {
                return Err(Error::Config(format!("extra_tx for `{slug}` is not finite")));
            }
            extra_tx.insert(key, value);
        }

        let config = StatsConfig {
            version,
            window_size,
            t_critical,
            reference_condition,
            whiskers,
            energy_factor,
            extra_tx,
            gen_size: self.gen_size.unwrap_or(defaults.gen_size),
        };
        config.validate()?;
        Ok(config)
    }
}

impl StatsConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(StatsConfig::default());
        }
        let parsed: StatsConfigInput = toml::from_str(input)
            .map_err(|e| Error::Config(format!("invalid config TOML: {e}")))?;
        parsed.resolve()
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be at least 1".to_string()));
        }
        if !self.t_critical.is_finite() || self.t_critical < 0.0 {
            return Err(Error::Config(format!(
                "t_critical must be a non-negative number, got {}",
                self.t_critical
            )));
        }
        let (low, high) = self.whiskers;
        if !(0.0..=100.0).contains(&low) || !(low..=100.0).contains(&high) {
            return Err(Error::Config(format!(
                "whiskers must be ordered percentiles in 0..=100, got [{low}, {high}]"
            )));
        }
        if !self.energy_factor.is_finite() {
            return Err(Error::Config("energy factor must be finite".to_string()));
        }
        if self.gen_size == 0 {
            return Err(Error::Config("gen_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Calibration constant for `key`; conditions without one get 0.
    pub fn extra_tx(&self, key: ConditionKey) -> f64 {
        self.extra_tx.get(&key).copied().unwrap_or(0.0)
    }
}
