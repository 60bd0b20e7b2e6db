use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use super::monitor::HealthMonitor;
use crate::audio::decode;
use crate::error::HealthError;
use crate::storage::records::AnalysisResult;

/// Results of one batch run, in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub recorded: Vec<(PathBuf, AnalysisResult)>,
    pub failed: Vec<(PathBuf, HealthError)>,
}

/// Decode and extract every file in parallel, then record the results in
/// the order the files were given so the patient history stays
/// chronological. A file that fails is reported in `failed` and skipped;
/// the rest still record.
pub fn analyze_files(
    monitor: &Arc<HealthMonitor>,
    patient_id: &str,
    paths: &[PathBuf],
    show_progress: bool,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();

    // One file runs inline, no worker pool needed
    if let [path] = paths {
        match decode::load_waveform(path).and_then(|w| monitor.analyze(patient_id, &w)) {
            Ok(result) => outcome.recorded.push((path.clone(), result)),
            Err(err) => outcome.failed.push(skipped(path, err)),
        }
        return Ok(outcome);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    let pb = if show_progress {
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("  Analyzing {bar:30.green/dim} {pos}/{len} {msg}")
                .context("Invalid progress bar template")?,
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let extracted = rt.block_on(async {
        let handles: Vec<_> = paths
            .iter()
            .cloned()
            .map(|path| {
                let monitor = Arc::clone(monitor);
                let pb = pb.clone();
                tokio::task::spawn_blocking(move || {
                    let features = decode::load_waveform(&path).and_then(|w| monitor.extract(&w));
                    pb.inc(1);
                    features
                })
            })
            .collect();

        let mut extracted = Vec::with_capacity(handles.len());
        for handle in handles {
            extracted.push(handle.await.context("Analysis task failed")?);
        }
        Ok::<_, anyhow::Error>(extracted)
    })?;
    pb.finish_and_clear();

    for (path, features) in paths.iter().zip(extracted) {
        match features {
            Ok(features) => {
                let result = monitor.record(patient_id, features);
                outcome.recorded.push((path.clone(), result));
            }
            Err(err) => outcome.failed.push(skipped(path, err)),
        }
    }

    Ok(outcome)
}

fn skipped(path: &Path, err: HealthError) -> (PathBuf, HealthError) {
    warn!(path = %path.display(), error = %err, "Skipping recording");
    (path.to_path_buf(), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::f32::consts::PI;

    fn write_tone(dir: &tempfile::TempDir, name: &str, freq: f32, amplitude: f32) -> PathBuf {
        let path = dir.path().join(name);
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..16_000 {
            let s = amplitude * (2.0 * PI * freq * i as f32 / 16_000.0).sin();
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn records_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_tone(&dir, "a.wav", 120.0, 0.5),
            write_tone(&dir, "b.wav", 200.0, 0.5),
            write_tone(&dir, "c.wav", 160.0, 0.5),
        ];
        let monitor = Arc::new(HealthMonitor::default());

        let outcome = analyze_files(&monitor, "p", &paths, false).unwrap();
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.recorded.len(), 3);

        let history = monitor.recent("p", 3).unwrap();
        let pitches: Vec<f64> = history.iter().map(|r| r.metrics.pitch.value).collect();
        assert!((pitches[0] - 120.0).abs() < 5.0, "{pitches:?}");
        assert!((pitches[1] - 200.0).abs() < 5.0, "{pitches:?}");
        assert!((pitches[2] - 160.0).abs() < 5.0, "{pitches:?}");

        for ((path, result), stored) in outcome.recorded.iter().zip(&history) {
            assert_eq!(result, stored, "{}", path.display());
        }
    }

    #[test]
    fn failures_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("notes.txt");
        std::fs::write(&bad, "not audio").unwrap();
        let paths = vec![
            write_tone(&dir, "good.wav", 150.0, 0.5),
            bad.clone(),
            dir.path().join("missing.wav"),
        ];
        let monitor = Arc::new(HealthMonitor::default());

        let outcome = analyze_files(&monitor, "p", &paths, false).unwrap();
        assert_eq!(outcome.recorded.len(), 1);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].0, bad);
        assert!(matches!(outcome.failed[1].1, HealthError::Decode(_)));
        assert_eq!(monitor.history_len("p"), 1);
    }

    #[test]
    fn single_file_runs_inline() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![write_tone(&dir, "only.wav", 150.0, 0.5)];
        let monitor = Arc::new(HealthMonitor::default());

        let outcome = analyze_files(&monitor, "p", &paths, false).unwrap();
        assert_eq!(outcome.recorded.len(), 1);
        assert_eq!(monitor.latest("p").unwrap(), outcome.recorded[0].1);

        let bad = vec![dir.path().join("missing.wav")];
        let outcome = analyze_files(&monitor, "p", &bad, false).unwrap();
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(monitor.history_len("p"), 1);
    }

    #[test]
    fn empty_batch() {
        let monitor = Arc::new(HealthMonitor::default());
        let outcome = analyze_files(&monitor, "p", &[], false).unwrap();
        assert!(outcome.recorded.is_empty());
        assert!(outcome.failed.is_empty());
        assert!(matches!(monitor.latest("p"), Err(HealthError::NotFound(_))));
    }
}
