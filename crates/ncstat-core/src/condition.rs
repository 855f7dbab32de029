//! Experimental condition taxonomy and record classification.

use serde::{Serialize, Serializer};

use crate::record::{MeasurementRecord, RecordKind};

/// Coding scheme of a coded condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scheme {
    Full,
    Sparse,
    Recode,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Full => "full",
            Scheme::Sparse => "sparse",
            Scheme::Recode => "recode",
        }
    }

    /// Short prefix used in chart legends.
    pub fn legend_prefix(&self) -> &'static str {
        match self {
            Scheme::Full => "NC",
            Scheme::Sparse => "SNC",
            Scheme::Recode => "RNC",
        }
    }
}

/// Recognised redundancy levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Redundancy {
    R0,
    R50,
    R75,
    R100,
}

impl Redundancy {
    pub fn fraction(&self) -> f64 {
        match self {
            Redundancy::R0 => 0.0,
            Redundancy::R50 => 0.5,
            Redundancy::R75 => 0.75,
            Redundancy::R100 => 1.0,
        }
    }

    pub fn percent(&self) -> u32 {
        match self {
            Redundancy::R0 => 0,
            Redundancy::R50 => 50,
            Redundancy::R75 => 75,
            Redundancy::R100 => 100,
        }
    }

    /// Exact match against the logged fraction. Anything else is unknown.
    pub fn from_fraction(r: f64) -> Option<Self> {
        [
            Redundancy::R0,
            Redundancy::R50,
            Redundancy::R75,
            Redundancy::R100,
        ]
        .into_iter()
        .find(|level| level.fraction() == r)
    }

    fn from_percent(p: u32) -> Option<Self> {
        match p {
            0 => Some(Redundancy::R0),
            50 => Some(Redundancy::R50),
            75 => Some(Redundancy::R75),
            100 => Some(Redundancy::R100),
            _ => None,
        }
    }
}

/// One experimental condition. Ordering follows the legend order of the
/// comparison charts: baseline first, then NC, SNC, RNC by redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConditionKey {
    Baseline,
    Coded(Scheme, Redundancy),
}

impl ConditionKey {
    /// Every condition the classifier can produce, in legend order.
    pub const ALL: [ConditionKey; 11] = [
        ConditionKey::Baseline,
        ConditionKey::Coded(Scheme::Full, Redundancy::R0),
        ConditionKey::Coded(Scheme::Full, Redundancy::R50),
        ConditionKey::Coded(Scheme::Full, Redundancy::R75),
        ConditionKey::Coded(Scheme::Full, Redundancy::R100),
        ConditionKey::Coded(Scheme::Sparse, Redundancy::R50),
        ConditionKey::Coded(Scheme::Sparse, Redundancy::R75),
        ConditionKey::Coded(Scheme::Sparse, Redundancy::R100),
        ConditionKey::Coded(Scheme::Recode, Redundancy::R50),
        ConditionKey::Coded(Scheme::Recode, Redundancy::R75),
        ConditionKey::Coded(Scheme::Recode, Redundancy::R100),
    ];

    /// Stable identifier used in config tables and JSON output
    /// (`baseline`, `full_0`, `sparse_75`, ...).
    pub fn slug(&self) -> String {
        match self {
            ConditionKey::Baseline => "baseline".to_string(),
            ConditionKey::Coded(scheme, r) => format!("{}_{}", scheme.as_str(), r.percent()),
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        if s == "baseline" {
            return Some(ConditionKey::Baseline);
        }
        let (scheme, pct) = s.split_once('_')?;
        let scheme = match scheme {
            "full" => Scheme::Full,
            "sparse" => Scheme::Sparse,
            "recode" => Scheme::Recode,
            _ => return None,
        };
        let r = Redundancy::from_percent(pct.parse().ok()?)?;
        let key = ConditionKey::Coded(scheme, r);
        ConditionKey::ALL.contains(&key).then_some(key)
    }

    /// Legend label such as `OT ARQ`, `NC 4+2` or `RNC 4+4`.
    pub fn label(&self, gen_size: u32) -> String {
        match self {
            ConditionKey::Baseline => "OT ARQ".to_string(),
            ConditionKey::Coded(scheme, r) => {
                let extra = (gen_size as f64 * r.fraction()).round() as u32;
                format!("{} {}+{}", scheme.legend_prefix(), gen_size, extra)
            }
        }
    }
}

impl Serialize for ConditionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.slug())
    }
}

/// Map a record to its condition. First match wins:
///
/// 1. `block_full` at 0, 0.5, 0.75 or 1.0
/// 2. `block_sparse` at 0.5, 0.75 or 1.0
/// 3. `block_recode` at 0.5, 0.75 or 1.0
/// 4. `no_coding`
///
/// Everything else is `None` and gets skipped by the aggregator.
pub fn classify(record: &MeasurementRecord) -> Option<ConditionKey> {
    let kind = record.record_kind()?;
    let redundancy = record.redundancy.and_then(Redundancy::from_fraction);
    match (kind, redundancy) {
        (RecordKind::BlockFull, Some(r)) => Some(ConditionKey::Coded(Scheme::Full, r)),
        (RecordKind::BlockSparse, Some(r)) if r != Redundancy::R0 => {
            Some(ConditionKey::Coded(Scheme::Sparse, r))
        }
        (RecordKind::BlockRecode, Some(r)) if r != Redundancy::R0 => {
            Some(ConditionKey::Coded(Scheme::Recode, r))
        }
        (RecordKind::NoCoding, _) => Some(ConditionKey::Baseline),
        _ => None,
    }
}
