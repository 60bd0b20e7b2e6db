use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voicewatch")]
#[command(about = "Acoustic health metrics from short patient voice recordings")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze recordings for a patient, oldest first
    Analyze {
        /// Patient identifier the results are filed under
        patient_id: String,

        /// Recordings to analyze (.wav, .mp3, .flac)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Number of recent results to show afterwards (default from config)
        #[arg(long)]
        history: Option<usize>,

        #[command(flatten)]
        overrides: ThresholdArgs,

        /// Print results as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Render a trend chart PNG of the history window
        /// (default location when no path is given)
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        chart: Option<Option<PathBuf>>,
    },

    /// Show the alert bands in force after config and overrides
    Thresholds {
        #[command(flatten)]
        overrides: ThresholdArgs,

        /// Classify a value against its band, e.g. --check pitch=85
        #[arg(long = "check", value_name = "METRIC=VALUE", value_parser = parse_check)]
        checks: Vec<(String, f64)>,
    },

    /// Show where config and reports are stored
    Paths,
}

#[derive(Args, Default)]
pub struct ThresholdArgs {
    /// Override an alert band, e.g. --threshold pitch=90:280
    #[arg(long = "threshold", value_name = "METRIC=LOW:HIGH", value_parser = parse_threshold)]
    pub thresholds: Vec<ThresholdOverride>,
}

/// A band override as given on the command line. The metric name is
/// checked when the override is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdOverride {
    pub metric: String,
    pub low: f64,
    pub high: f64,
}

fn parse_threshold(s: &str) -> Result<ThresholdOverride, String> {
    let (metric, range) = s
        .split_once('=')
        .ok_or_else(|| format!("expected METRIC=LOW:HIGH, got '{s}'"))?;
    let (low, high) = range
        .split_once(':')
        .ok_or_else(|| format!("expected LOW:HIGH after '=', got '{range}'"))?;

    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid bound '{v}': {e}"))
    };

    Ok(ThresholdOverride {
        metric: metric.trim().to_string(),
        low: parse(low)?,
        high: parse(high)?,
    })
}

fn parse_check(s: &str) -> Result<(String, f64), String> {
    let (metric, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected METRIC=VALUE, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value '{value}': {e}"))?;
    Ok((metric.trim().to_string(), value))
}
