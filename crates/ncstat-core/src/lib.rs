//! # ncstat-core
//!
//! Windowed statistics for network-coding measurement logs.
//!
//! Measurement dumps from ARQ and RLNC runs over one- and two-hop wireless
//! links are reduced to per-condition series of disjoint window means,
//! with Student-t confidence intervals, energy estimates, per-hop
//! channel-loss estimates and retransmission distributions.
//!
//! ## Crate structure
//!
//! - [`record`] — Measurement record model and JSON decoding
//! - [`condition`] — Condition taxonomy and record classification
//! - [`window`] — Disjoint windowed means and per-condition buckets
//! - [`stats`] — Mean, standard deviation, confidence intervals, energy
//! - [`two_hop`] — Per-hop channel-loss estimation
//! - [`retx`] — Retransmission-count distributions
//! - [`aggregator`] — Single-pass stream aggregator
//! - [`summary`] — Serializable per-run summaries
//! - [`config`] — TOML configuration

pub mod aggregator;
pub mod condition;
pub mod config;
pub mod error;
pub mod record;
pub mod retx;
pub mod stats;
pub mod summary;
pub mod two_hop;
pub mod window;

pub use aggregator::{
    aggregate_one_hop, aggregate_two_hop, AggregateReport, StreamAggregator, TwoHopStreams,
};
pub use condition::{classify, ConditionKey, Redundancy, Scheme};
pub use config::StatsConfig;
pub use error::{Error, Result};
pub use record::{parse_records, read_records, MeasurementRecord, RecordKind};
pub use stats::{confidence_interval, derived_energy, ConfidenceInterval};
pub use summary::{summarize, RunSummary};
