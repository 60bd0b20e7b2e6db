use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HealthError;

/// The fixed set of tracked acoustic metrics.
///
/// Serialized names match the keys of the `metrics` object in a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Pitch,
    SpeechRate,
    PauseDuration,
    VoiceEnergy,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Pitch,
        MetricKind::SpeechRate,
        MetricKind::PauseDuration,
        MetricKind::VoiceEnergy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Pitch => "pitch",
            MetricKind::SpeechRate => "speech_rate",
            MetricKind::PauseDuration => "pause_duration",
            MetricKind::VoiceEnergy => "voice_energy",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::Pitch => "Hz",
            MetricKind::SpeechRate => "words/min",
            MetricKind::PauseDuration => "seconds",
            MetricKind::VoiceEnergy => "normalized",
        }
    }

    /// Position in `ALL`, used to index per-metric tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| HealthError::UnknownMetric(s.to_string()))
    }
}

/// Classification of a single metric against its alert band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Normal,
    Warning,
    Critical,
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            MetricStatus::Normal => "normal",
            MetricStatus::Warning => "warning",
            MetricStatus::Critical => "critical",
        })
    }
}

/// Aggregate status across all metrics of one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Normal,
    AttentionNeeded,
    Critical,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            OverallStatus::Normal => "normal",
            OverallStatus::AttentionNeeded => "attention_needed",
            OverallStatus::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub value: f64,
    pub unit: String,
    pub status: MetricStatus,
}

/// One Metric per known metric name.
///
/// A struct rather than a map: a result cannot be built with a metric
/// missing, and it serializes to the same `{name: metric}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub pitch: Metric,
    pub speech_rate: Metric,
    pub pause_duration: Metric,
    pub voice_energy: Metric,
}

impl Metrics {
    pub fn get(&self, kind: MetricKind) -> &Metric {
        match kind {
            MetricKind::Pitch => &self.pitch,
            MetricKind::SpeechRate => &self.speech_rate,
            MetricKind::PauseDuration => &self.pause_duration,
            MetricKind::VoiceEnergy => &self.voice_energy,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, &Metric)> + '_ {
        MetricKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIndicators {
    /// 0.0 (rested) to 1.0 (fatigued)
    pub fatigue_score: f64,
    /// 0.0 (calm) to 1.0 (stressed)
    pub stress_indicator: f64,
    pub overall_status: OverallStatus,
}

/// A complete analysis of one recording. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sample_id: Uuid,
    /// UTC creation time, ISO-8601
    pub timestamp: String,
    pub patient_id: String,
    pub metrics: Metrics,
    pub health_indicators: HealthIndicators,
    /// Never empty
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(value: f64, kind: MetricKind, status: MetricStatus) -> Metric {
        Metric {
            value,
            unit: kind.unit().into(),
            status,
        }
    }

    #[test]
    fn metric_names_parse() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.name().parse::<MetricKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_metric_name_rejected() {
        let err = "heart_rate".parse::<MetricKind>().unwrap_err();
        assert!(matches!(err, HealthError::UnknownMetric(ref name) if name == "heart_rate"));
    }

    #[test]
    fn index_matches_all_order() {
        for (i, kind) in MetricKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn result_json_shape() {
        let result = AnalysisResult {
            sample_id: Uuid::nil(),
            timestamp: "2026-02-08T10:00:00.000000Z".into(),
            patient_id: "P001".into(),
            metrics: Metrics {
                pitch: metric(112.4, MetricKind::Pitch, MetricStatus::Normal),
                speech_rate: metric(95.0, MetricKind::SpeechRate, MetricStatus::Warning),
                pause_duration: metric(0.4, MetricKind::PauseDuration, MetricStatus::Normal),
                voice_energy: metric(0.1, MetricKind::VoiceEnergy, MetricStatus::Critical),
            },
            health_indicators: HealthIndicators {
                fatigue_score: 0.9,
                stress_indicator: 0.22,
                overall_status: OverallStatus::AttentionNeeded,
            },
            recommendations: vec!["Consider follow-up".into()],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["metrics"]["speech_rate"]["status"], "warning");
        assert_eq!(json["metrics"]["pitch"]["unit"], "Hz");
        assert_eq!(json["health_indicators"]["overall_status"], "attention_needed");
        assert_eq!(json["sample_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["metrics"].as_object().unwrap().len(), 4);
    }

    #[test]
    fn metrics_iter_covers_every_kind() {
        let m = Metrics {
            pitch: metric(1.0, MetricKind::Pitch, MetricStatus::Normal),
            speech_rate: metric(2.0, MetricKind::SpeechRate, MetricStatus::Normal),
            pause_duration: metric(3.0, MetricKind::PauseDuration, MetricStatus::Normal),
            voice_energy: metric(4.0, MetricKind::VoiceEnergy, MetricStatus::Normal),
        };
        let values: Vec<(MetricKind, f64)> = m.iter().map(|(k, m)| (k, m.value)).collect();
        assert_eq!(
            values,
            vec![
                (MetricKind::Pitch, 1.0),
                (MetricKind::SpeechRate, 2.0),
                (MetricKind::PauseDuration, 3.0),
                (MetricKind::VoiceEnergy, 4.0),
            ]
        );
    }
}
