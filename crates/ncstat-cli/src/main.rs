//! ncstat
//!
//! Reduces network-coding measurement dumps to per-condition statistics.
//!
//! - `one-hop` reads a single source dump
//! - `two-hop` reads the coded source/relay dumps and the uncoded
//!   source/relay/destination dumps of one run
//!
//! Output is a text table for the chosen view, or the full summary as
//! JSON for a plotting front end. Logs go to stderr (`RUST_LOG`).

mod render;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use ncstat_core::{
    aggregate_one_hop, aggregate_two_hop, read_records, summarize, MeasurementRecord,
    StatsConfig, TwoHopStreams,
};
use tracing_subscriber::EnvFilter;

use render::View;

/// Network-coding measurement statistics.
#[derive(Parser, Debug)]
#[command(name = "ncstat", about = "Windowed loss/transmission statistics for measurement dumps")]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Records per window (overrides the config file).
    #[arg(long)]
    window: Option<usize>,

    /// Student-t critical value (overrides the config file).
    #[arg(long)]
    t_critical: Option<f64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Single-link measurement.
    OneHop {
        /// Source dump.
        #[arg(long)]
        json: PathBuf,

        #[arg(long, value_enum, default_value_t = View::Loss)]
        view: View,
    },
    /// Source → relay → destination measurement.
    TwoHop {
        /// Coded runs, source dump.
        #[arg(long)]
        src: PathBuf,

        /// Coded runs, relay dump.
        #[arg(long)]
        relay: PathBuf,

        /// Uncoded run, source dump.
        #[arg(long)]
        baseline_src: PathBuf,

        /// Uncoded run, relay dump.
        #[arg(long)]
        baseline_relay: PathBuf,

        /// Uncoded run, destination dump.
        #[arg(long)]
        baseline_dst: PathBuf,

        #[arg(long, value_enum, default_value_t = View::Loss)]
        view: View,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<StatsConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            StatsConfig::from_toml_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => StatsConfig::default(),
    };
    if let Some(window) = cli.window {
        config.window_size = window;
    }
    if let Some(t) = cli.t_critical {
        config.t_critical = t;
    }
    config.validate()?;
    Ok(config)
}

fn load_dump(path: &Path) -> anyhow::Result<Vec<MeasurementRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let records = read_records(BufReader::new(file))
        .with_context(|| format!("decoding {}", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "dump loaded");
    Ok(records)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::info!(
        window = config.window_size,
        t_critical = config.t_critical,
        reference = %config.reference_condition.slug(),
        "ncstat starting"
    );

    let (report, view) = match &cli.command {
        Command::OneHop { json, view } => {
            let records = load_dump(json)?;
            (aggregate_one_hop(&records, &config)?, *view)
        }
        Command::TwoHop {
            src,
            relay,
            baseline_src,
            baseline_relay,
            baseline_dst,
            view,
        } => {
            let coded_src = load_dump(src)?;
            let coded_relay = load_dump(relay)?;
            let b_src = load_dump(baseline_src)?;
            let b_relay = load_dump(baseline_relay)?;
            let b_dst = load_dump(baseline_dst)?;
            let streams = TwoHopStreams {
                coded_src: &coded_src,
                coded_relay: &coded_relay,
                baseline_src: &b_src,
                baseline_relay: &b_relay,
                baseline_dst: &b_dst,
            };
            (aggregate_two_hop(streams, &config)?, *view)
        }
    };

    if report.skipped > 0 {
        tracing::info!(skipped = report.skipped, "records outside the known conditions");
    }

    let summary = summarize(&report, &config);
    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        Format::Text => print!("{}", render::render(&summary, view)?),
    }
    Ok(())
}
