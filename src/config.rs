use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::thresholds::ThresholdBand;
use crate::dsp::frames::FrameConfig;
use crate::dsp::pitch::PitchConfig;
use crate::dsp::tempo::TempoConfig;
use crate::paths;
use crate::storage::records::MetricKind;

/// Application configuration, loaded from config.toml.
///
/// serde's `default` attribute means: if a field is missing from the TOML file,
/// use the value from the Default implementation instead of failing to parse.
/// This makes the config file optional; every field has a sensible default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub thresholds: ThresholdsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Every waveform is resampled to this rate before extraction.
    pub reference_sample_rate: u32,
    pub pitch_floor_hz: f32,
    pub pitch_ceiling_hz: f32,
    pub frame_size_ms: f32,
    pub hop_size_ms: f32,
    pub power_threshold: f64,
    pub clarity_threshold: f64,
    /// Frames quieter than this (dBFS) are never given a pitch.
    pub silence_gate_db: f32,
    /// RMS frame length in samples, shared by energy and pause detection.
    pub rms_frame_length: usize,
    pub rms_hop_length: usize,
    /// Frames more than this many dB below the loudest frame are silence.
    pub silence_top_db: f32,
    pub min_tempo_bpm: f32,
    pub max_tempo_bpm: f32,
    pub start_tempo_bpm: f32,
    /// Default number of results shown by history queries.
    pub history_window: usize,
}

/// Alert bands applied at startup, one per metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub pitch: ThresholdBand,
    pub speech_rate: ThresholdBand,
    pub pause_duration: ThresholdBand,
    pub voice_energy: ThresholdBand,
}

impl ThresholdsConfig {
    pub fn band(&self, kind: MetricKind) -> ThresholdBand {
        match kind {
            MetricKind::Pitch => self.pitch,
            MetricKind::SpeechRate => self.speech_rate,
            MetricKind::PauseDuration => self.pause_duration,
            MetricKind::VoiceEnergy => self.voice_energy,
        }
    }
}

// --- Default implementations ---

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reference_sample_rate: 16_000,
            // C2 .. C7: the span of tones a human voice is expected to hit.
            pitch_floor_hz: 65.41,
            pitch_ceiling_hz: 2093.0,
            frame_size_ms: 30.0,
            hop_size_ms: 10.0,
            power_threshold: 0.2,
            clarity_threshold: 0.5,
            silence_gate_db: -60.0,
            rms_frame_length: 2048,
            rms_hop_length: 512,
            silence_top_db: 30.0,
            min_tempo_bpm: 30.0,
            max_tempo_bpm: 300.0,
            start_tempo_bpm: 120.0,
            history_window: 5,
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            pitch: ThresholdBand::new(80.0, 300.0),
            speech_rate: ThresholdBand::new(90.0, 160.0),
            pause_duration: ThresholdBand::new(0.0, 2.0),
            voice_energy: ThresholdBand::new(0.3, 1.0),
        }
    }
}

/// Bridges from the user-facing config into the parameter structs the
/// DSP code expects.
impl From<&AnalysisConfig> for PitchConfig {
    fn from(cfg: &AnalysisConfig) -> Self {
        PitchConfig {
            pitch_floor_hz: cfg.pitch_floor_hz,
            pitch_ceiling_hz: cfg.pitch_ceiling_hz,
            frame_size_ms: cfg.frame_size_ms,
            hop_size_ms: cfg.hop_size_ms,
            power_threshold: cfg.power_threshold,
            clarity_threshold: cfg.clarity_threshold,
            silence_gate_db: cfg.silence_gate_db,
        }
    }
}

impl From<&AnalysisConfig> for FrameConfig {
    fn from(cfg: &AnalysisConfig) -> Self {
        FrameConfig {
            frame_length: cfg.rms_frame_length,
            hop_length: cfg.rms_hop_length,
        }
    }
}

impl From<&AnalysisConfig> for TempoConfig {
    fn from(cfg: &AnalysisConfig) -> Self {
        TempoConfig {
            min_bpm: cfg.min_tempo_bpm,
            max_bpm: cfg.max_tempo_bpm,
            start_bpm: cfg.start_tempo_bpm,
            ..TempoConfig::default()
        }
    }
}

/// Load the application config. An explicit path must exist; the default
/// location ($XDG_CONFIG_HOME/voicewatch/config.toml) falls back to
/// defaults when the file is absent.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let default_path = paths::config_file();
            if !default_path.exists() {
                return Ok(AppConfig::default());
            }
            default_path
        }
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
