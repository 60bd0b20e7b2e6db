pub mod charts;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use crate::analysis::thresholds::ThresholdBand;
use crate::storage::records::{AnalysisResult, MetricKind, MetricStatus, OverallStatus};

/// Machine-readable output of an `analyze` run.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub results: Vec<JsonEntry<'a>>,
    pub failures: Vec<JsonFailure>,
    pub history: &'a [AnalysisResult],
}

#[derive(Debug, Serialize)]
pub struct JsonEntry<'a> {
    pub file: &'a Path,
    pub result: &'a AnalysisResult,
}

#[derive(Debug, Serialize)]
pub struct JsonFailure {
    pub file: PathBuf,
    pub error: String,
}

pub fn to_json(report: &JsonReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

pub fn styled_status(status: MetricStatus) -> String {
    let text = format!("{status:<8}");
    match status {
        MetricStatus::Normal => style(text).green().to_string(),
        MetricStatus::Warning => style(text).yellow().to_string(),
        MetricStatus::Critical => style(text).red().bold().to_string(),
    }
}

pub fn styled_overall(status: OverallStatus) -> String {
    match status {
        OverallStatus::Normal => style(status).green().to_string(),
        OverallStatus::AttentionNeeded => style(status).yellow().to_string(),
        OverallStatus::Critical => style(status).red().bold().to_string(),
    }
}

/// One result as a metrics table followed by indicators and recommendations.
pub fn format_result(result: &AnalysisResult, source: Option<&Path>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{}\n",
        style(format!("=== {} ===", result.patient_id)).bold()
    ));
    if let Some(path) = source {
        out.push_str(&format!("  File:      {}\n", style(path.display()).cyan()));
    }
    out.push_str(&format!("  Sample:    {}\n", style(result.sample_id).dim()));
    out.push_str(&format!("  Recorded:  {}\n\n", result.timestamp));

    for (kind, metric) in result.metrics.iter() {
        out.push_str(&format!(
            "  {:16} {:>9.2} {:10} {}\n",
            kind.name(),
            metric.value,
            metric.unit,
            styled_status(metric.status)
        ));
    }
    out.push('\n');

    let indicators = &result.health_indicators;
    out.push_str(&format!("  Fatigue:   {:.2}\n", indicators.fatigue_score));
    out.push_str(&format!("  Stress:    {:.2}\n", indicators.stress_indicator));
    out.push_str(&format!(
        "  Overall:   {}\n\n",
        styled_overall(indicators.overall_status)
    ));

    out.push_str(&format!("{}\n", style("  Recommendations").bold()));
    for rec in &result.recommendations {
        out.push_str(&format!("    - {rec}\n"));
    }

    out
}

/// Compact one-line-per-result view of a history window, oldest first.
pub fn format_history(history: &[AnalysisResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        style(format!("=== Recent history ({}) ===", history.len())).bold()
    ));
    out.push_str(&format!(
        "  {:27} {:>8} {:>8} {:>6} {:>6}  {}\n",
        "timestamp", "pitch", "rate", "pause", "energy", "overall"
    ));
    for r in history {
        out.push_str(&format!(
            "  {:27} {:>8.2} {:>8.2} {:>6.2} {:>6.2}  {}\n",
            r.timestamp,
            r.metrics.pitch.value,
            r.metrics.speech_rate.value,
            r.metrics.pause_duration.value,
            r.metrics.voice_energy.value,
            styled_overall(r.health_indicators.overall_status)
        ));
    }
    out
}

pub fn format_thresholds(bands: &[(MetricKind, ThresholdBand); 4]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", style("=== Alert bands ===").bold()));
    for (kind, band) in bands {
        out.push_str(&format!(
            "  {:16} {:>9.2} .. {:<9.2} {}\n",
            kind.name(),
            band.low,
            band.high,
            kind.unit()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::Features;
    use crate::analysis::monitor::HealthMonitor;

    fn result() -> AnalysisResult {
        HealthMonitor::default().record(
            "p-1",
            Features {
                pitch_hz: 0.0,
                energy: 0.0,
                speech_rate_bpm: 0.0,
                pause_secs: 0.0,
            },
        )
    }

    #[test]
    fn result_lists_every_metric_and_recommendation() {
        let text = format_result(&result(), Some(Path::new("morning.wav")));
        for name in ["pitch", "speech_rate", "pause_duration", "voice_energy"] {
            assert!(text.contains(name), "missing {name}");
        }
        assert!(text.contains("morning.wav"));
        assert!(text.contains("critical"));
        assert!(text.contains("Consider follow-up"));
        assert!(text.contains("Check medication timing"));
    }

    #[test]
    fn result_layout() {
        let text = format_result(&result(), None);
        // title, sample, recorded, blank, 4 metrics, blank,
        // 3 indicators, blank, heading, 2 recommendations
        assert_eq!(text.lines().count(), 16);
        assert!(text.ends_with('\n'));
        assert!(!text.contains("File:"));
    }

    #[test]
    fn history_has_one_row_per_result() {
        let r = result();
        let text = format_history(&[r.clone(), r]);
        // title + header + rows
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn thresholds_show_units() {
        let text = format_thresholds(&HealthMonitor::default().thresholds());
        assert!(text.contains("words/min"));
        assert!(text.contains("300.00"));
    }

    #[test]
    fn json_report_shape() {
        let r = result();
        let history = vec![r.clone()];
        let report = JsonReport {
            results: vec![JsonEntry {
                file: Path::new("a.wav"),
                result: &r,
            }],
            failures: vec![JsonFailure {
                file: PathBuf::from("b.mp3"),
                error: "Failed to decode audio: b.mp3: no audio track".into(),
            }],
            history: &history,
        };

        let value: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert_eq!(value["results"][0]["file"], "a.wav");
        assert_eq!(
            value["results"][0]["result"]["health_indicators"]["overall_status"],
            "critical"
        );
        assert_eq!(value["results"][0]["result"]["metrics"]["pitch"]["unit"], "Hz");
        assert_eq!(value["failures"][0]["file"], "b.mp3");
        assert_eq!(value["history"].as_array().unwrap().len(), 1);
    }
}
