//! # Measurement Records
//!
//! One record per logged generation attempt, as dumped by the source,
//! relay and destination nodes. Every field is optional at decode time:
//! relay dumps carry `fwd_num`, destination dumps carry `rx_num`, and so
//! on. Consumers ask for the fields they need through the `require_*`
//! accessors, which turn an absent or out-of-domain value into
//! [`Error::MalformedRecord`] instead of guessing a default.
//!
//! A field holding a value of the wrong JSON type decodes as absent, so
//! it is reported against its record index and name only when a matched
//! record actually needs it. Skipped records are never type-checked.

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// ─── Record Kind ────────────────────────────────────────────────────────────

/// Transmission scheme a record was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Uncoded ARQ.
    NoCoding,
    /// Dense RLNC over the whole generation.
    BlockFull,
    /// Sparse RLNC.
    BlockSparse,
    /// RLNC with recoding at the relay.
    BlockRecode,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::NoCoding => "no_coding",
            RecordKind::BlockFull => "block_full",
            RecordKind::BlockSparse => "block_sparse",
            RecordKind::BlockRecode => "block_recode",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no_coding" => Some(RecordKind::NoCoding),
            "block_full" => Some(RecordKind::BlockFull),
            "block_sparse" => Some(RecordKind::BlockSparse),
            "block_recode" => Some(RecordKind::BlockRecode),
            _ => None,
        }
    }
}

// ─── Measurement Record ─────────────────────────────────────────────────────

/// A single flat object from a measurement dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Scheme name as logged (`no_coding`, `block_full`, ...). Unknown
    /// names are kept so the classifier can skip them.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    /// Coding overhead as a fraction of the generation size.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub redundancy: Option<f64>,
    /// Residual loss observed for this generation (0 when delivered).
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub loss_rate: Option<f64>,
    /// Transmissions made by the source.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tx_num: Option<u32>,
    /// Forwards made by the relay.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fwd_num: Option<u32>,
    /// Packets received by the destination.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub rx_num: Option<u32>,
    /// Packets per generation.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub gen_size: Option<u32>,
}

impl MeasurementRecord {
    /// Parsed scheme, or `None` when the logged name is not one we know.
    pub fn record_kind(&self) -> Option<RecordKind> {
        self.kind.as_deref().and_then(RecordKind::parse)
    }

    /// The raw `type` string. Absence is malformed, an unknown value is not.
    pub fn require_kind(&self, index: usize) -> Result<&str> {
        self.kind.as_deref().ok_or(Error::MalformedRecord {
            index,
            field: "type",
        })
    }

    pub fn require_loss_rate(&self, index: usize) -> Result<f64> {
        match self.loss_rate {
            Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(Error::MalformedRecord {
                index,
                field: "loss_rate",
            }),
        }
    }

    pub fn require_tx_num(&self, index: usize) -> Result<u32> {
        self.tx_num.ok_or(Error::MalformedRecord {
            index,
            field: "tx_num",
        })
    }

    pub fn require_fwd_num(&self, index: usize) -> Result<u32> {
        self.fwd_num.ok_or(Error::MalformedRecord {
            index,
            field: "fwd_num",
        })
    }

    pub fn require_rx_num(&self, index: usize) -> Result<u32> {
        self.rx_num.ok_or(Error::MalformedRecord {
            index,
            field: "rx_num",
        })
    }

    /// Generation size; zero is rejected along with absence.
    pub fn require_gen_size(&self, index: usize) -> Result<u32> {
        match self.gen_size {
            Some(n) if n > 0 => Ok(n),
            _ => Err(Error::MalformedRecord {
                index,
                field: "gen_size",
            }),
        }
    }
}

// ─── Decoding ───────────────────────────────────────────────────────────────

/// Decode a present field, keeping `None` when the value has the wrong type.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Decode a JSON array of records.
pub fn parse_records(input: &str) -> Result<Vec<MeasurementRecord>> {
    Ok(serde_json::from_str(input)?)
}

/// Decode a JSON array of records from a reader.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<MeasurementRecord>> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flat_records() {
        let json = r#"[
            {"type": "block_full", "redundancy": 0.5, "loss_rate": 0.0, "tx_num": 6, "gen_size": 4},
            {"type": "no_coding", "loss_rate": 0.25, "tx_num": 9, "rx_num": 4}
        ]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_kind(), Some(RecordKind::BlockFull));
        assert_eq!(records[0].redundancy, Some(0.5));
        assert_eq!(records[0].gen_size, Some(4));
        assert_eq!(records[1].record_kind(), Some(RecordKind::NoCoding));
        assert_eq!(records[1].rx_num, Some(4));
        assert!(records[1].redundancy.is_none());
    }

    #[test]
    fn unknown_keys_and_kinds_are_kept() {
        let json = r#"[{"type": "block_future", "loss_rate": 0, "tx_num": 1, "seq": 17}]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records[0].kind.as_deref(), Some("block_future"));
        assert!(records[0].record_kind().is_none());
    }

    #[test]
    fn integer_loss_rate_decodes_as_float() {
        let records =
            parse_records(r#"[{"type": "no_coding", "loss_rate": 0, "tx_num": 1}]"#).unwrap();
        assert_eq!(records[0].require_loss_rate(0).unwrap(), 0.0);
    }

    #[test]
    fn missing_field_names_the_field() {
        let record = MeasurementRecord {
            kind: Some("no_coding".into()),
            loss_rate: Some(0.0),
            ..Default::default()
        };
        match record.require_tx_num(7) {
            Err(Error::MalformedRecord { index, field }) => {
                assert_eq!(index, 7);
                assert_eq!(field, "tx_num");
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn negative_loss_rate_rejected() {
        let record = MeasurementRecord {
            loss_rate: Some(-0.1),
            ..Default::default()
        };
        assert!(record.require_loss_rate(0).is_err());
    }

    #[test]
    fn zero_gen_size_rejected() {
        let record = MeasurementRecord {
            gen_size: Some(0),
            ..Default::default()
        };
        assert!(record.require_gen_size(0).is_err());
    }

    #[test]
    fn mistyped_field_decodes_as_absent() {
        let records =
            parse_records(r#"[{"type": "no_coding", "loss_rate": 0, "tx_num": 1.5}]"#).unwrap();
        assert!(records[0].tx_num.is_none());
        assert!(matches!(
            records[0].require_tx_num(0),
            Err(Error::MalformedRecord {
                index: 0,
                field: "tx_num"
            })
        ));
    }

    #[test]
    fn mistyped_fields_do_not_abort_the_dump() {
        let json = r#"[
            {"type": "calibration", "tx_num": "n/a", "redundancy": null},
            {"type": 3, "loss_rate": "x"},
            {"type": "no_coding", "loss_rate": 0, "tx_num": 2}
        ]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].kind.as_deref(), Some("calibration"));
        assert!(records[0].tx_num.is_none());
        assert!(records[1].kind.is_none());
        assert_eq!(records[2].require_tx_num(2).unwrap(), 2);
    }

    #[test]
    fn negative_count_is_absent() {
        let records = parse_records(r#"[{"rx_num": -1, "fwd_num": 4}]"#).unwrap();
        assert!(records[0].rx_num.is_none());
        assert_eq!(records[0].fwd_num, Some(4));
    }

    #[test]
    fn not_an_array_is_json_error() {
        assert!(matches!(parse_records("{}"), Err(Error::Json(_))));
    }

    #[test]
    fn kind_round_trip_names() {
        for kind in [
            RecordKind::NoCoding,
            RecordKind::BlockFull,
            RecordKind::BlockSparse,
            RecordKind::BlockRecode,
        ] {
            assert_eq!(RecordKind::parse(kind.as_str()), Some(kind));
        }
    }
}
