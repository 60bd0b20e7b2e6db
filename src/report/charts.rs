use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use plotters::coord::types::{RangedCoordf64, RangedCoordusize};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::analysis::thresholds::ThresholdBand;
use crate::storage::records::{AnalysisResult, MetricKind};

/// Chart dimensions
const WIDTH: u32 = 1200;
const PANEL_HEIGHT: u32 = 250;
const PANELS: u32 = 4;
const TOTAL_HEIGHT: u32 = PANEL_HEIGHT * PANELS + 80; // extra for title

const COLOR_PITCH: RGBColor = RGBColor(41, 128, 185); // blue
const COLOR_RATE: RGBColor = RGBColor(142, 68, 173); // purple
const COLOR_PAUSE: RGBColor = RGBColor(231, 76, 60); // red
const COLOR_ENERGY: RGBColor = RGBColor(46, 204, 113); // green
const COLOR_THRESHOLD: RGBColor = RGBColor(200, 200, 200); // light gray

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Render a patient's history as a four-panel trend PNG.
///
/// One panel per metric, oldest result on the left. The active band for
/// each metric is drawn as a pair of dashed lines.
pub fn render_trend_chart(
    history: &[AnalysisResult],
    bands: &[(MetricKind, ThresholdBand); 4],
    output_path: &Path,
) -> Result<()> {
    if history.is_empty() {
        bail!("No results to chart");
    }
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let root = BitMapBackend::new(output_path, (WIDTH, TOTAL_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).context("Failed to fill background")?;

    let title = format!("Voice Health Trend: {}", history[0].patient_id);
    root.draw(&Text::new(
        title,
        (20, 15),
        ("sans-serif", 28).into_font().color(&BLACK),
    ))
    .context("Failed to draw title")?;

    let panels_area = root.margin(60, 10, 10, 10);
    let panels = panels_area.split_evenly((PANELS as usize, 1));

    let labels = time_labels(history);

    for ((kind, band), panel) in bands.iter().zip(&panels) {
        let values: Vec<f64> = history.iter().map(|r| r.metrics.get(*kind).value).collect();
        draw_metric(panel, *kind, *band, &values, &labels)?;
    }

    root.present().context("Failed to write chart PNG")?;

    Ok(())
}

fn draw_metric(
    area: &Panel,
    kind: MetricKind,
    band: ThresholdBand,
    values: &[f64],
    labels: &[String],
) -> Result<()> {
    let (y_min, y_max) = axis_range(values, band);
    let x_range = 0..values.len().max(2);
    let color = series_color(kind);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{} ({})", caption(kind), kind.unit()), ("sans-serif", 18))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range.clone(), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|x| labels.get(*x).cloned().unwrap_or_default())
        .draw()?;

    draw_horizontal_line(&mut chart, band.low, x_range.end)?;
    draw_horizontal_line(&mut chart, band.high, x_range.end)?;

    let points: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    chart.draw_series(LineSeries::new(points.iter().copied(), &color))?;
    chart.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 4, color.filled())))?;

    Ok(())
}

fn draw_horizontal_line(
    chart: &mut ChartContext<BitMapBackend, Cartesian2d<RangedCoordusize, RangedCoordf64>>,
    y_val: f64,
    x_end: usize,
) -> Result<()> {
    chart.draw_series(DashedLineSeries::new(
        vec![(0usize, y_val), (x_end, y_val)],
        5,
        3,
        COLOR_THRESHOLD.into(),
    ))?;
    Ok(())
}

fn caption(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Pitch => "Pitch",
        MetricKind::SpeechRate => "Speech Rate",
        MetricKind::PauseDuration => "Pause Duration",
        MetricKind::VoiceEnergy => "Voice Energy",
    }
}

fn series_color(kind: MetricKind) -> RGBColor {
    match kind {
        MetricKind::Pitch => COLOR_PITCH,
        MetricKind::SpeechRate => COLOR_RATE,
        MetricKind::PauseDuration => COLOR_PAUSE,
        MetricKind::VoiceEnergy => COLOR_ENERGY,
    }
}

/// X-axis labels: time of day of each result, "HH:MM:SS".
/// Unparseable timestamps are shown as-is.
fn time_labels(history: &[AnalysisResult]) -> Vec<String> {
    history
        .iter()
        .map(|r| {
            DateTime::parse_from_rfc3339(&r.timestamp)
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|_| r.timestamp.clone())
        })
        .collect()
}

/// Y-axis range covering both the data and the band, with 10% margin.
fn axis_range(values: &[f64], band: ThresholdBand) -> (f64, f64) {
    let min = values.iter().copied().fold(band.low, f64::min);
    let max = values.iter().copied().fold(band.high, f64::max);
    let margin = (max - min).max(1e-3) * 0.1;
    (min - margin, max + margin)
}
