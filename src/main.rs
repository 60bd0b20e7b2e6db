mod analysis;
mod audio;
mod cli;
mod config;
mod dsp;
mod error;
mod paths;
mod report;
mod storage;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use analysis::batch;
use analysis::monitor::HealthMonitor;
use analysis::thresholds::ThresholdRegistry;
use cli::{Cli, Command, ThresholdArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Paths => {
            println!("Config:  {}", paths::config_file().display());
            println!("Reports: {}", paths::reports_dir().display());
            Ok(())
        }

        Command::Thresholds { overrides, checks } => {
            let monitor = build_monitor(cli.config.as_deref())?;
            apply_overrides(&monitor, &overrides)?;
            print!("{}", report::format_thresholds(&monitor.thresholds()));

            for (metric, value) in &checks {
                let band = monitor.threshold(metric)?;
                let status = monitor.classify(metric, *value)?;
                println!(
                    "  {metric} = {value} -> {} (band {}..{})",
                    report::styled_status(status),
                    band.low,
                    band.high
                );
            }
            Ok(())
        }

        Command::Analyze {
            patient_id,
            files,
            history,
            overrides,
            json,
            chart,
        } => {
            let monitor = Arc::new(build_monitor(cli.config.as_deref())?);
            apply_overrides(&monitor, &overrides)?;
            run_analyze(&monitor, &patient_id, &files, history, json, chart)
        }
    }
}

/// Load config and build the monitor the commands share.
fn build_monitor(config_path: Option<&std::path::Path>) -> Result<HealthMonitor> {
    let config = config::load_config(config_path)?;
    let thresholds = ThresholdRegistry::with_bands(&config.thresholds)
        .context("Invalid [thresholds] in config")?;
    Ok(HealthMonitor::new(config.analysis, thresholds))
}

fn apply_overrides(monitor: &HealthMonitor, args: &ThresholdArgs) -> Result<()> {
    for o in &args.thresholds {
        monitor
            .configure(&o.metric, o.low, o.high)
            .with_context(|| format!("Rejected --threshold {}={}:{}", o.metric, o.low, o.high))?;
    }
    Ok(())
}

fn run_analyze(
    monitor: &Arc<HealthMonitor>,
    patient_id: &str,
    files: &[PathBuf],
    history: Option<usize>,
    json: bool,
    chart: Option<Option<PathBuf>>,
) -> Result<()> {
    let outcome = batch::analyze_files(monitor, patient_id, files, !json)?;

    let latest = match monitor.latest(patient_id) {
        Ok(latest) => latest,
        Err(err) => {
            // Every file failed, so there is nothing to report on
            for (path, e) in &outcome.failed {
                eprintln!("{} {}: {e}", style("error:").red().bold(), path.display());
            }
            return Err(err).context("No recordings could be analyzed");
        }
    };
    let window = history.unwrap_or(monitor.config().history_window);
    let recent = monitor.recent(patient_id, window)?;

    if json {
        let report = report::JsonReport {
            results: outcome
                .recorded
                .iter()
                .map(|(file, result)| report::JsonEntry { file, result })
                .collect(),
            failures: outcome
                .failed
                .iter()
                .map(|(file, err)| report::JsonFailure {
                    file: file.clone(),
                    error: err.to_string(),
                })
                .collect(),
            history: &recent,
        };
        println!("{}", report::to_json(&report)?);
    } else {
        for (path, result) in &outcome.recorded {
            println!("{}", report::format_result(result, Some(path)));
        }
        for (path, err) in &outcome.failed {
            eprintln!("{} {}: {err}", style("skipped:").yellow().bold(), path.display());
        }
        print!("{}", report::format_history(&recent));
        println!(
            "\nLatest status: {} ({} of {} results on file shown)",
            report::styled_overall(latest.health_indicators.overall_status),
            recent.len(),
            monitor.history_len(patient_id)
        );
    }

    if let Some(chart) = chart {
        let chart_path = chart.unwrap_or_else(|| paths::trend_chart_path(patient_id));
        report::charts::render_trend_chart(&recent, &monitor.thresholds(), &chart_path)?;
        eprintln!("Chart saved to {}", style(chart_path.display()).green());
    }

    Ok(())
}
