use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::records::AnalysisResult;
use crate::error::{HealthError, HealthResult};

/// In-memory, append-only history of analysis results per patient.
///
/// Insertion order is chronological order. Nothing is ever removed or
/// rewritten; `append` is the only mutator. All access goes through one
/// lock, so a query never observes a half-appended record.
#[derive(Debug, Default)]
pub struct PatientStore {
    histories: RwLock<HashMap<String, Vec<AnalysisResult>>>,
}

impl PatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result to its patient's history. Returns the new length.
    pub fn append(&self, patient_id: &str, result: AnalysisResult) -> usize {
        let mut histories = self.histories.write();
        let history = histories.entry(patient_id.to_string()).or_default();
        debug!(
            patient_id,
            sample_id = %result.sample_id,
            "Appending analysis result"
        );
        history.push(result);
        history.len()
    }

    /// The most recent result for a patient.
    pub fn latest(&self, patient_id: &str) -> HealthResult<AnalysisResult> {
        self.histories
            .read()
            .get(patient_id)
            .and_then(|history| history.last())
            .cloned()
            .ok_or_else(|| HealthError::NotFound(patient_id.to_string()))
    }

    /// The last `n` results for a patient, oldest first.
    /// Returns fewer than `n` when the history is shorter.
    pub fn recent(&self, patient_id: &str, n: usize) -> HealthResult<Vec<AnalysisResult>> {
        let histories = self.histories.read();
        let history = histories
            .get(patient_id)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| HealthError::NotFound(patient_id.to_string()))?;

        let start = history.len().saturating_sub(n);
        Ok(history[start..].to_vec())
    }

    /// Number of stored results; 0 for a patient never seen.
    pub fn history_len(&self, patient_id: &str) -> usize {
        self.histories
            .read()
            .get(patient_id)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::records::*;
    use uuid::Uuid;

    fn metric(value: f64) -> Metric {
        Metric {
            value,
            unit: "Hz".into(),
            status: MetricStatus::Normal,
        }
    }

    fn sample_result(patient_id: &str, pitch: f64) -> AnalysisResult {
        AnalysisResult {
            sample_id: Uuid::new_v4(),
            timestamp: "2026-01-15T09:30:00.000000Z".into(),
            patient_id: patient_id.into(),
            metrics: Metrics {
                pitch: metric(pitch),
                speech_rate: metric(120.0),
                pause_duration: metric(0.5),
                voice_energy: metric(0.5),
            },
            health_indicators: HealthIndicators {
                fatigue_score: 0.5,
                stress_indicator: 0.2,
                overall_status: OverallStatus::Normal,
            },
            recommendations: vec!["No action needed".into()],
        }
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let store = PatientStore::new();
        assert!(matches!(
            store.latest("nonexistent"),
            Err(HealthError::NotFound(ref id)) if id == "nonexistent"
        ));
        assert!(matches!(
            store.recent("nonexistent", 5),
            Err(HealthError::NotFound(_))
        ));
        assert_eq!(store.history_len("nonexistent"), 0);
    }

    #[test]
    fn latest_returns_appended_record() {
        let store = PatientStore::new();
        let first = sample_result("P001", 100.0);
        let second = sample_result("P001", 110.0);

        assert_eq!(store.append("P001", first), 1);
        assert_eq!(store.append("P001", second.clone()), 2);
        assert_eq!(store.latest("P001").unwrap(), second);
    }

    #[test]
    fn recent_returns_last_n_in_order() {
        let store = PatientStore::new();
        for i in 0..7 {
            store.append("P001", sample_result("P001", 100.0 + i as f64));
        }

        let last3 = store.recent("P001", 3).unwrap();
        let pitches: Vec<f64> = last3.iter().map(|r| r.metrics.pitch.value).collect();
        assert_eq!(pitches, vec![104.0, 105.0, 106.0]);

        // History itself is never truncated by queries
        assert_eq!(store.history_len("P001"), 7);
    }

    #[test]
    fn recent_when_fewer_than_n() {
        let store = PatientStore::new();
        store.append("P001", sample_result("P001", 100.0));
        assert_eq!(store.recent("P001", 100).unwrap().len(), 1);
    }

    #[test]
    fn recent_is_idempotent_without_appends() {
        let store = PatientStore::new();
        for i in 0..4 {
            store.append("P001", sample_result("P001", 90.0 + i as f64));
        }
        assert_eq!(store.recent("P001", 5).unwrap(), store.recent("P001", 5).unwrap());
    }

    #[test]
    fn patients_are_independent() {
        let store = PatientStore::new();
        store.append("P001", sample_result("P001", 100.0));
        store.append("P002", sample_result("P002", 200.0));

        assert_eq!(store.latest("P001").unwrap().metrics.pitch.value, 100.0);
        assert_eq!(store.latest("P002").unwrap().metrics.pitch.value, 200.0);
        assert_eq!(store.history_len("P001"), 1);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let store = PatientStore::new();
        std::thread::scope(|s| {
            for t in 0..4 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..25 {
                        store.append("P001", sample_result("P001", (t * 100 + i) as f64));
                    }
                });
            }
        });
        assert_eq!(store.history_len("P001"), 100);
        assert_eq!(store.recent("P001", 1000).unwrap().len(), 100);
    }
}
