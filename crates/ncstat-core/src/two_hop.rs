//! Per-hop channel-loss estimation for source → relay → destination runs.

use crate::error::{Error, Result};

/// Channel-loss estimate for each hop of one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopLoss {
    pub hop_one: f64,
    pub hop_two: f64,
}

/// Estimate per-hop loss from one paired source/relay observation.
///
/// Hop one is the share of source transmissions the relay never forwarded.
/// Hop two compares relay forwards against what the destination needed to
/// decode (`(1 - loss_rate) · gen_size`). A relay that forwarded nothing
/// gives a hop-two estimate of exactly 0.
pub fn hop_loss(src_tx: u32, relay_fwd: u32, loss_rate: f64, gen_size: u32) -> Result<HopLoss> {
    if src_tx == 0 {
        return Err(Error::Domain(
            "hop-one loss undefined for zero source transmissions".to_string(),
        ));
    }
    let src_tx = src_tx as f64;
    let fwd = relay_fwd as f64;
    let hop_one = (src_tx - fwd) / src_tx;
    let hop_two = if relay_fwd == 0 {
        0.0
    } else {
        (fwd - (1.0 - loss_rate) * gen_size as f64) / fwd
    };
    Ok(HopLoss { hop_one, hop_two })
}
