use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::{resample, Waveform};
use crate::config::AnalysisConfig;
use crate::dsp::frames::{self, FrameConfig};
use crate::dsp::pitch::{self, PitchConfig};
use crate::dsp::pauses;
use crate::dsp::tempo::{self, TempoConfig};
use crate::error::{HealthError, HealthResult};

/// The four acoustic features of one recording, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Features {
    /// Median F0 over voiced frames; 0.0 when nothing was voiced.
    pub pitch_hz: f64,
    /// Mean frame RMS.
    pub energy: f64,
    /// Tempo estimate standing in for words per minute.
    pub speech_rate_bpm: f64,
    /// Mean gap between non-silent intervals.
    pub pause_secs: f64,
}

/// Resample to the reference rate and compute all four features.
///
/// Each feature is computed independently from the same resampled
/// waveform. An empty waveform is an error; a silent one is not and
/// yields zeros.
pub fn extract_features(waveform: &Waveform, config: &AnalysisConfig) -> HealthResult<Features> {
    if waveform.is_empty() {
        return Err(HealthError::EmptyInput);
    }

    let wave = resample::to_reference_rate(waveform.clone(), config.reference_sample_rate)?;
    let sr = wave.sample_rate;

    let pitch_config = PitchConfig::from(config);
    let frame_config = FrameConfig::from(config);
    let tempo_config = TempoConfig::from(config);

    let contour = pitch::extract_pitch_contour(&wave.samples, sr, &pitch_config);
    let pitch_hz = pitch::median_pitch(&contour);
    let energy = frames::mean_rms(&wave.samples, &frame_config);
    let speech_rate = tempo::estimate_tempo(&wave.samples, sr, &tempo_config);
    let pause = pauses::mean_pause_secs(&wave.samples, sr, &frame_config, config.silence_top_db);

    debug!(
        duration_secs = wave.duration_secs(),
        voiced_fraction = pitch::voiced_fraction(&contour),
        pitch_hz,
        energy,
        speech_rate,
        pause,
        "Extracted features"
    );

    Ok(Features {
        pitch_hz: pitch_hz as f64,
        energy: energy as f64,
        speech_rate_bpm: speech_rate as f64,
        pause_secs: pause as f64,
    })
}
