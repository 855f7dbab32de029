//! Error type shared by every stage of the aggregation pipeline.

use thiserror::Error;

/// Errors raised while decoding, validating or summarising measurement data.
#[derive(Debug, Error)]
pub enum Error {
    /// A statistic was requested outside its domain (too few samples,
    /// zero denominator).
    #[error("domain error: {0}")]
    Domain(String),

    /// A record that matched a condition lacks a field the computation needs.
    #[error("record {index}: missing or invalid field `{field}`")]
    MalformedRecord { index: usize, field: &'static str },

    /// A paired stream ended before the source stream did.
    #[error("record {index}: no paired record in {stream} stream")]
    UnpairedRecord { index: usize, stream: &'static str },

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
