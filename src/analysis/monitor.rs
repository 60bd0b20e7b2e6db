use chrono::{SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use super::features::{self, Features};
use super::scoring;
use super::thresholds::{ThresholdBand, ThresholdRegistry};
use crate::audio::Waveform;
use crate::config::AnalysisConfig;
use crate::error::HealthResult;
use crate::storage::records::{AnalysisResult, Metric, MetricKind, MetricStatus, Metrics};
use crate::storage::store::PatientStore;
use crate::util;

/// The analysis pipeline plus the state it shares across calls.
///
/// Built once at startup and shared (usually behind an `Arc`). Every
/// method takes `&self`; the registry and the store carry their own locks.
#[derive(Debug)]
pub struct HealthMonitor {
    config: AnalysisConfig,
    thresholds: ThresholdRegistry,
    store: PatientStore,
}

impl HealthMonitor {
    pub fn new(config: AnalysisConfig, thresholds: ThresholdRegistry) -> Self {
        Self {
            config,
            thresholds,
            store: PatientStore::new(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Resample and extract features. Does not touch shared state.
    pub fn extract(&self, waveform: &Waveform) -> HealthResult<Features> {
        features::extract_features(waveform, &self.config)
    }

    /// Classify and score extracted features, then append the result to
    /// the patient's history.
    pub fn record(&self, patient_id: &str, features: Features) -> AnalysisResult {
        // All four metrics are classified against one registry read
        let bands = self.thresholds.snapshot();
        let metrics = classify_features(&bands, &features);

        let score = scoring::score(&metrics, features.pitch_hz, features.energy);

        let result = AnalysisResult {
            sample_id: Uuid::new_v4(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            patient_id: patient_id.to_string(),
            metrics,
            health_indicators: score.indicators,
            recommendations: score.recommendations,
        };

        let len = self.store.append(patient_id, result.clone());
        info!(
            patient_id,
            sample_id = %result.sample_id,
            status = %result.health_indicators.overall_status,
            history_len = len,
            "Recorded analysis"
        );
        result
    }

    /// Full pipeline for one recording. Nothing is stored on failure.
    pub fn analyze(&self, patient_id: &str, waveform: &Waveform) -> HealthResult<AnalysisResult> {
        let features = self.extract(waveform)?;
        Ok(self.record(patient_id, features))
    }

    /// Update one metric's alert band, returning the band now in force.
    /// A rejected update leaves the previous band in place.
    pub fn configure(&self, metric_name: &str, low: f64, high: f64) -> HealthResult<ThresholdBand> {
        self.thresholds.set_named(metric_name, low, high)?;
        Ok(ThresholdBand::new(low, high))
    }

    /// Current band for a metric name.
    pub fn threshold(&self, metric_name: &str) -> HealthResult<ThresholdBand> {
        self.thresholds.get_named(metric_name)
    }

    /// Classify a value against the current band for a metric name.
    pub fn classify(&self, metric_name: &str, value: f64) -> HealthResult<MetricStatus> {
        self.thresholds.classify_named(metric_name, value)
    }

    pub fn thresholds(&self) -> [(MetricKind, ThresholdBand); 4] {
        self.thresholds.snapshot()
    }

    pub fn latest(&self, patient_id: &str) -> HealthResult<AnalysisResult> {
        self.store.latest(patient_id)
    }

    pub fn recent(&self, patient_id: &str, n: usize) -> HealthResult<Vec<AnalysisResult>> {
        self.store.recent(patient_id, n)
    }

    pub fn history_len(&self, patient_id: &str) -> usize {
        self.store.history_len(patient_id)
    }
}

/// Round and classify each feature against a fixed set of bands.
/// Classification uses the unrounded value.
fn classify_features(bands: &[(MetricKind, ThresholdBand); 4], features: &Features) -> Metrics {
    let metric = |kind: MetricKind, value: f64| Metric {
        value: util::round2(value),
        unit: kind.unit().to_string(),
        status: bands[kind.index()].1.classify(value),
    };

    Metrics {
        pitch: metric(MetricKind::Pitch, features.pitch_hz),
        speech_rate: metric(MetricKind::SpeechRate, features.speech_rate_bpm),
        pause_duration: metric(MetricKind::PauseDuration, features.pause_secs),
        voice_energy: metric(MetricKind::VoiceEnergy, features.energy),
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(AnalysisConfig::default(), ThresholdRegistry::default())
    }
}
