use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ThresholdsConfig;
use crate::error::{HealthError, HealthResult};
use crate::storage::records::{MetricKind, MetricStatus};

/// Inclusive [low, high] alert band for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub low: f64,
    pub high: f64,
}

impl ThresholdBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Classify a value against this band.
    ///
    /// Outside [low, high] is critical. Inside, the value is a warning when
    /// it sits within 10% of a bound: below `low * 1.1` or above
    /// `high * 0.9`. For narrow bands where `low * 1.1 > high * 0.9` the
    /// two margins overlap and every in-band value is a warning; the
    /// margins are applied as-is, without clamping. NaN is critical.
    pub fn classify(&self, value: f64) -> MetricStatus {
        if value.is_nan() || value < self.low || value > self.high {
            MetricStatus::Critical
        } else if value < self.low * 1.1 || value > self.high * 0.9 {
            MetricStatus::Warning
        } else {
            MetricStatus::Normal
        }
    }

    /// Check low <= high. NaN bounds fail too.
    fn validate(&self, kind: MetricKind) -> HealthResult<()> {
        if self.low <= self.high {
            Ok(())
        } else {
            Err(HealthError::InvalidRange {
                metric: kind.name().to_string(),
                low: self.low,
                high: self.high,
            })
        }
    }
}

/// Process-wide alert bands, one per metric.
///
/// Reads and writes go through a single lock, so a classification never
/// sees a half-updated band. Updates are visible to every evaluation that
/// starts after `set` returns.
#[derive(Debug)]
pub struct ThresholdRegistry {
    bands: RwLock<[ThresholdBand; 4]>,
}

impl Default for ThresholdRegistry {
    fn default() -> Self {
        let config = ThresholdsConfig::default();
        Self {
            bands: RwLock::new(MetricKind::ALL.map(|kind| config.band(kind))),
        }
    }
}

impl ThresholdRegistry {
    /// Build a registry from configured bands, rejecting any with low > high.
    pub fn with_bands(config: &ThresholdsConfig) -> HealthResult<Self> {
        let mut bands = [ThresholdBand::new(0.0, 0.0); 4];
        for kind in MetricKind::ALL {
            let band = config.band(kind);
            band.validate(kind)?;
            bands[kind.index()] = band;
        }
        Ok(Self {
            bands: RwLock::new(bands),
        })
    }

    pub fn get(&self, kind: MetricKind) -> ThresholdBand {
        self.bands.read()[kind.index()]
    }

    /// Look up a band by metric name.
    pub fn get_named(&self, metric_name: &str) -> HealthResult<ThresholdBand> {
        Ok(self.get(metric_name.parse::<MetricKind>()?))
    }

    /// Replace a metric's band, returning the previous one.
    /// A rejected update leaves the current band untouched.
    pub fn set(&self, kind: MetricKind, band: ThresholdBand) -> HealthResult<ThresholdBand> {
        if let Err(err) = band.validate(kind) {
            warn!(metric = %kind, low = band.low, high = band.high, "Rejected threshold update");
            return Err(err);
        }

        let previous = {
            let mut bands = self.bands.write();
            std::mem::replace(&mut bands[kind.index()], band)
        };
        info!(
            metric = %kind,
            old_low = previous.low,
            old_high = previous.high,
            low = band.low,
            high = band.high,
            "Threshold updated"
        );
        Ok(previous)
    }

    /// Update a band by metric name and bounds, as the configuration
    /// surface receives them.
    pub fn set_named(&self, metric_name: &str, low: f64, high: f64) -> HealthResult<ThresholdBand> {
        let kind = metric_name.parse::<MetricKind>().inspect_err(|_| {
            warn!(metric = metric_name, "Rejected threshold update for unknown metric");
        })?;
        self.set(kind, ThresholdBand::new(low, high))
    }

    /// Classify a value against the current band for `kind`.
    pub fn classify(&self, kind: MetricKind, value: f64) -> MetricStatus {
        self.get(kind).classify(value)
    }

    /// Classify by metric name; unknown names fail.
    pub fn classify_named(&self, metric_name: &str, value: f64) -> HealthResult<MetricStatus> {
        Ok(self.classify(metric_name.parse::<MetricKind>()?, value))
    }

    /// Consistent copy of all four bands, in `MetricKind::ALL` order.
    pub fn snapshot(&self) -> [(MetricKind, ThresholdBand); 4] {
        let bands = *self.bands.read();
        MetricKind::ALL.map(|kind| (kind, bands[kind.index()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands() {
        let registry = ThresholdRegistry::default();
        assert_eq!(registry.get(MetricKind::Pitch), ThresholdBand::new(80.0, 300.0));
        assert_eq!(registry.get(MetricKind::SpeechRate), ThresholdBand::new(90.0, 160.0));
        assert_eq!(registry.get(MetricKind::PauseDuration), ThresholdBand::new(0.0, 2.0));
        assert_eq!(registry.get(MetricKind::VoiceEnergy), ThresholdBand::new(0.3, 1.0));
    }

    #[test]
    fn classify_tiers() {
        let band = ThresholdBand::new(80.0, 300.0);
        assert_eq!(band.classify(50.0), MetricStatus::Critical);
        assert_eq!(band.classify(301.0), MetricStatus::Critical);
        // 80 * 1.1 = 88, 300 * 0.9 = 270
        assert_eq!(band.classify(85.0), MetricStatus::Warning);
        assert_eq!(band.classify(280.0), MetricStatus::Warning);
        assert_eq!(band.classify(150.0), MetricStatus::Normal);
    }

    #[test]
    fn bounds_are_not_critical() {
        // Critical needs strictly below low or strictly above high
        let band = ThresholdBand::new(80.0, 300.0);
        assert_ne!(band.classify(80.0), MetricStatus::Critical);
        assert_ne!(band.classify(300.0), MetricStatus::Critical);

        // A bound is normal when it falls outside both soft margins,
        // e.g. low = 0 where 0 * 1.1 = 0
        let band = ThresholdBand::new(0.0, 2.0);
        assert_eq!(band.classify(0.0), MetricStatus::Normal);
    }

    #[test]
    fn below_low_stays_critical() {
        let band = ThresholdBand::new(0.3, 1.0);
        let mut value = 0.29;
        while value > -1.0 {
            assert_eq!(band.classify(value), MetricStatus::Critical);
            value -= 0.05;
        }
    }

    #[test]
    fn nan_value_is_critical() {
        let band = ThresholdBand::new(0.3, 1.0);
        assert_eq!(band.classify(f64::NAN), MetricStatus::Critical);
    }

    #[test]
    fn narrow_band_margins_overlap() {
        // 100 * 1.1 = 110 > 105 * 0.9 = 94.5: every in-band value is a warning
        let band = ThresholdBand::new(100.0, 105.0);
        assert_eq!(band.classify(102.0), MetricStatus::Warning);
        assert_eq!(band.classify(99.0), MetricStatus::Critical);
    }

    #[test]
    fn set_returns_previous_band() {
        let registry = ThresholdRegistry::default();
        let previous = registry
            .set(MetricKind::Pitch, ThresholdBand::new(50.0, 400.0))
            .unwrap();
        assert_eq!(previous, ThresholdBand::new(80.0, 300.0));
        assert_eq!(registry.get(MetricKind::Pitch), ThresholdBand::new(50.0, 400.0));
        assert_eq!(registry.classify(MetricKind::Pitch, 60.0), MetricStatus::Normal);
    }

    #[test]
    fn inverted_range_rejected_and_band_kept() {
        let registry = ThresholdRegistry::default();
        let err = registry.set_named("pitch", 400.0, 100.0).unwrap_err();
        assert!(matches!(err, HealthError::InvalidRange { ref metric, .. } if metric == "pitch"));

        assert_eq!(registry.get(MetricKind::Pitch), ThresholdBand::new(80.0, 300.0));
        assert_eq!(registry.classify(MetricKind::Pitch, 150.0), MetricStatus::Normal);
    }

    #[test]
    fn nan_bound_rejected() {
        let registry = ThresholdRegistry::default();
        assert!(registry
            .set(MetricKind::VoiceEnergy, ThresholdBand::new(f64::NAN, 1.0))
            .is_err());
        assert_eq!(registry.get(MetricKind::VoiceEnergy), ThresholdBand::new(0.3, 1.0));
    }

    #[test]
    fn equal_bounds_accepted() {
        let registry = ThresholdRegistry::default();
        assert!(registry.set_named("pause_duration", 1.0, 1.0).is_ok());
    }

    #[test]
    fn unknown_metric_rejected() {
        let registry = ThresholdRegistry::default();
        assert!(matches!(
            registry.set_named("heart_rate", 1.0, 2.0),
            Err(HealthError::UnknownMetric(_))
        ));
        assert!(matches!(
            registry.get_named("heart_rate"),
            Err(HealthError::UnknownMetric(_))
        ));
        assert!(matches!(
            registry.classify_named("heart_rate", 1.0),
            Err(HealthError::UnknownMetric(_))
        ));
    }

    #[test]
    fn classify_named_uses_current_band() {
        let registry = ThresholdRegistry::default();
        assert_eq!(
            registry.classify_named("voice_energy", 0.1).unwrap(),
            MetricStatus::Critical
        );
    }

    #[test]
    fn with_bands_rejects_invalid_config() {
        let config = ThresholdsConfig {
            speech_rate: ThresholdBand::new(200.0, 100.0),
            ..ThresholdsConfig::default()
        };
        assert!(matches!(
            ThresholdRegistry::with_bands(&config),
            Err(HealthError::InvalidRange { ref metric, .. }) if metric == "speech_rate"
        ));
    }

    #[test]
    fn snapshot_lists_every_metric() {
        let registry = ThresholdRegistry::default();
        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0], (MetricKind::Pitch, ThresholdBand::new(80.0, 300.0)));
        assert_eq!(snapshot[3].0, MetricKind::VoiceEnergy);
    }

    #[test]
    fn concurrent_readers_see_whole_bands() {
        let registry = ThresholdRegistry::default();
        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..200 {
                    let low = i as f64;
                    registry
                        .set(MetricKind::Pitch, ThresholdBand::new(low, low + 100.0))
                        .unwrap();
                }
            });
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let band = registry.get(MetricKind::Pitch);
                        // Either the default or one of the writer's bands
                        assert!(
                            band == ThresholdBand::new(80.0, 300.0)
                                || (band.high - band.low - 100.0).abs() < 1e-9
                        );
                    }
                });
            }
        });
    }
}
