//! Plain-text tables for each summary view.

use std::fmt::{self, Write};

use clap::ValueEnum;
use ncstat_core::stats::{BoxStats, ConfidenceInterval};
use ncstat_core::summary::{ChannelSeriesSummary, ConditionSummary};
use ncstat_core::RunSummary;

/// Which statistic to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Windowed loss probability per condition.
    Loss,
    /// Windowed transmission count per condition.
    Tx,
    /// Loss against transmissions, with intervals on both.
    Mix,
    /// Loss against derived energy.
    Final,
    /// Channel-loss estimates of the reference condition, per window.
    ChannelLoss,
    /// Retransmission-count distribution of the baseline.
    Retx,
}

fn opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string())
}

fn ci(v: Option<ConfidenceInterval>) -> String {
    match v {
        Some(ci) => format!("[{:.4}, {:.4}]", ci.lower, ci.upper),
        None => "-".to_string(),
    }
}

fn spread(v: Option<BoxStats>) -> String {
    match v {
        Some(b) => format!("{:.4} [{:.4}, {:.4}]", b.median, b.whisker_low, b.whisker_high),
        None => "-".to_string(),
    }
}

fn header(out: &mut String, summary: &RunSummary) -> fmt::Result {
    writeln!(
        out,
        "# window={} t={} matched={} skipped={}",
        summary.window_size, summary.t_critical, summary.matched, summary.skipped
    )
}

fn series_table<F>(out: &mut String, summary: &RunSummary, unit: &str, pick: F) -> fmt::Result
where
    F: Fn(&ConditionSummary) -> (Option<f64>, Option<ConfidenceInterval>, Option<BoxStats>),
{
    let (low, high) = summary.whiskers;
    writeln!(
        out,
        "{:<10} {:>7} {:>7} {:>10} {:>22} {:>30}",
        "condition",
        "windows",
        "pending",
        unit,
        "interval",
        format!("median [p{low}, p{high}]")
    )?;
    for c in &summary.conditions {
        let (mean, interval, spread_box) = pick(c);
        writeln!(
            out,
            "{:<10} {:>7} {:>7} {:>10} {:>22} {:>30}",
            c.label,
            c.windows,
            c.pending,
            opt(mean),
            ci(interval),
            spread(spread_box)
        )?;
    }
    Ok(())
}

fn pair_table<F>(out: &mut String, summary: &RunSummary, unit: &str, pick: F) -> fmt::Result
where
    F: Fn(&ConditionSummary) -> (Option<f64>, Option<ConfidenceInterval>),
{
    writeln!(
        out,
        "{:<10} {:>10} {:>22} {:>10} {:>22}",
        "condition", "loss", "loss interval", unit, "interval"
    )?;
    for c in &summary.conditions {
        let (value, interval) = pick(c);
        writeln!(
            out,
            "{:<10} {:>10} {:>22} {:>10} {:>22}",
            c.label,
            opt(c.loss_mean),
            ci(c.loss_ci),
            opt(value),
            ci(interval)
        )?;
    }
    Ok(())
}

fn percent(s: &ChannelSeriesSummary) -> String {
    s.percent
        .map(|p| format!("~{p}%"))
        .unwrap_or_else(|| "-".to_string())
}

fn channel_table(out: &mut String, summary: &RunSummary) -> fmt::Result {
    let Some(channel) = &summary.channel_loss else {
        return writeln!(out, "no records for the channel-loss reference condition");
    };
    writeln!(
        out,
        "# {} total {} hop one {} hop two {}",
        channel.condition.slug(),
        percent(&channel.total),
        percent(&channel.hop_one),
        percent(&channel.hop_two)
    )?;
    writeln!(out, "{:>6} {:>10} {:>10} {:>10}", "round", "total", "hop one", "hop two")?;
    for (round, total) in channel.total.series.iter().enumerate() {
        writeln!(
            out,
            "{:>6} {:>10.4} {:>10} {:>10}",
            round,
            total,
            opt(channel.hop_one.series.get(round).copied()),
            opt(channel.hop_two.series.get(round).copied())
        )?;
    }
    Ok(())
}

fn retx_table(out: &mut String, summary: &RunSummary) -> fmt::Result {
    for (name, dist) in [
        ("hop one", &summary.hop_one_retx),
        ("hop two", &summary.hop_two_retx),
    ] {
        if dist.is_empty() {
            continue;
        }
        writeln!(out, "# {name}")?;
        writeln!(out, "{:>6} {:>10}", "tx", "share")?;
        for (k, share) in &dist.shares {
            writeln!(out, "{k:>6} {share:>10.4}")?;
        }
    }
    Ok(())
}

/// Render `view` as a text table.
pub fn render(summary: &RunSummary, view: View) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(1024);
    header(&mut out, summary)?;
    match view {
        View::Loss => series_table(&mut out, summary, "loss", |c| {
            (c.loss_mean, c.loss_ci, c.loss_box)
        })?,
        View::Tx => series_table(&mut out, summary, "tx", |c| (c.tx_mean, c.tx_ci, c.tx_box))?,
        View::Mix => pair_table(&mut out, summary, "tx", |c| (c.tx_mean, c.tx_ci))?,
        View::Final => pair_table(&mut out, summary, "energy", |c| (c.energy, c.energy_ci))?,
        View::ChannelLoss => channel_table(&mut out, summary)?,
        View::Retx => retx_table(&mut out, summary)?,
    }
    Ok(out)
}
