use crate::storage::records::{HealthIndicators, Metrics, MetricStatus, OverallStatus};
use crate::util;

pub const FOLLOW_UP: &str = "Consider follow-up";
pub const CHECK_MEDICATION: &str = "Check medication timing";
pub const NO_ACTION: &str = "No action needed";

/// Fatigue above this adds the medication-timing recommendation.
const FATIGUE_ALERT: f64 = 0.6;

/// Pitch at which the stress indicator saturates.
const STRESS_SATURATION_HZ: f64 = 500.0;

/// Lower vocal energy reads as higher fatigue: `1 - energy`, clamped to [0, 1].
pub fn fatigue_score(energy: f64) -> f64 {
    (1.0 - energy).clamp(0.0, 1.0)
}

/// Higher pitch reads as higher stress, saturating at 500 Hz.
pub fn stress_indicator(pitch_hz: f64) -> f64 {
    (pitch_hz / STRESS_SATURATION_HZ).clamp(0.0, 1.0)
}

/// Any critical metric makes the whole result critical; otherwise any
/// warning means attention is needed.
pub fn overall_status(metrics: &Metrics) -> OverallStatus {
    let statuses: Vec<MetricStatus> = metrics.iter().map(|(_, m)| m.status).collect();

    if statuses.contains(&MetricStatus::Critical) {
        OverallStatus::Critical
    } else if statuses.contains(&MetricStatus::Warning) {
        OverallStatus::AttentionNeeded
    } else {
        OverallStatus::Normal
    }
}

/// Recommendations for a scored result. Never empty.
pub fn recommendations(status: OverallStatus, fatigue: f64) -> Vec<String> {
    let mut recs = Vec::new();
    if status != OverallStatus::Normal {
        recs.push(FOLLOW_UP.to_string());
    }
    if fatigue > FATIGUE_ALERT {
        recs.push(CHECK_MEDICATION.to_string());
    }
    if recs.is_empty() {
        recs.push(NO_ACTION.to_string());
    }
    recs
}

/// Health indicators plus recommendations for one set of classified metrics.
pub struct Score {
    pub indicators: HealthIndicators,
    pub recommendations: Vec<String>,
}

/// Combine classified metrics with the fatigue and stress heuristics.
///
/// `pitch` and `energy` are the unrounded feature values; the indicators
/// are rounded to two decimals for reporting, while the recommendation
/// threshold sees the exact fatigue score.
pub fn score(metrics: &Metrics, pitch: f64, energy: f64) -> Score {
    let fatigue = fatigue_score(energy);
    let stress = stress_indicator(pitch);
    let status = overall_status(metrics);

    Score {
        indicators: HealthIndicators {
            fatigue_score: util::round2(fatigue),
            stress_indicator: util::round2(stress),
            overall_status: status,
        },
        recommendations: recommendations(status, fatigue),
    }
}
