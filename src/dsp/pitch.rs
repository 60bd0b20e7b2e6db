use pitch_detection::detector::mcleod::McLeodDetector;
use pitch_detection::detector::PitchDetector;

use super::windowing;
use crate::util;

/// Configuration for pitch extraction.
#[derive(Debug, Clone)]
pub struct PitchConfig {
    /// Minimum accepted frequency in Hz (C2 by default).
    pub pitch_floor_hz: f32,

    /// Maximum accepted frequency in Hz (C7 by default).
    pub pitch_ceiling_hz: f32,

    /// Analysis window duration in milliseconds.
    pub frame_size_ms: f32,

    /// How far to advance between frames, in milliseconds.
    pub hop_size_ms: f32,

    /// McLeod power threshold: filters out low-energy frames.
    pub power_threshold: f64,

    /// McLeod clarity threshold (0.0-1.0): how periodic a frame must be.
    pub clarity_threshold: f64,

    /// Frames whose RMS is below this level (dBFS) are unvoiced without
    /// running the detector.
    pub silence_gate_db: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            pitch_floor_hz: 65.41,
            pitch_ceiling_hz: 2093.0,
            frame_size_ms: 30.0,
            hop_size_ms: 10.0,
            power_threshold: 0.2,
            clarity_threshold: 0.5,
            silence_gate_db: -60.0,
        }
    }
}

/// A single point in a pitch contour: a timestamp and an optional frequency.
/// `None` means the frame was unvoiced (no detectable pitch).
#[derive(Debug, Clone)]
pub struct PitchFrame {
    /// Time in seconds from the start of the audio.
    pub time: f32,

    /// Detected fundamental frequency, or None if unvoiced.
    pub frequency: Option<f32>,
}

/// Extract a pitch contour from audio samples.
///
/// Slides a window across the audio, runs the McLeod pitch detector on
/// each Hann-windowed frame, and keeps only frequencies inside
/// [floor, ceiling]. McLeod finds the period from a normalized
/// autocorrelation, which holds up well against the strong harmonics of
/// voiced speech.
pub fn extract_pitch_contour(
    samples: &[f32],
    sample_rate: u32,
    config: &PitchConfig,
) -> Vec<PitchFrame> {
    let sr = sample_rate as f32;

    let frame_size = (config.frame_size_ms / 1000.0 * sr) as usize;
    let hop_size = ((config.hop_size_ms / 1000.0 * sr) as usize).max(1);

    // The Hann taper shrinks the usable part of each buffer, so size it for
    // four full cycles of the lowest frequency. At 65 Hz and 16 kHz:
    // 4 * 16000 / 65.41 = 979 samples, rounded up to a power of two for
    // the FFT inside the detector.
    let min_buffer = (4.0 * sr / config.pitch_floor_hz).ceil() as usize;
    let detector_size = min_buffer.next_power_of_two().max(frame_size);
    let padding = detector_size / 2;

    let mut detector = McLeodDetector::new(detector_size, padding);
    let mut contour = Vec::new();
    let mut pos = 0;

    while pos + detector_size <= samples.len() {
        let time = pos as f32 / sr;
        let frame = &samples[pos..pos + detector_size];

        let frequency = if util::rms_db(frame) < config.silence_gate_db {
            None
        } else {
            let windowed: Vec<f64> = windowing::apply_hann(frame)
                .iter()
                .map(|&s| s as f64)
                .collect();

            detector
                .get_pitch(
                    &windowed,
                    sample_rate as usize,
                    config.power_threshold,
                    config.clarity_threshold,
                )
                .map(|p| p.frequency as f32)
                .filter(|&f| f >= config.pitch_floor_hz && f <= config.pitch_ceiling_hz)
        };

        contour.push(PitchFrame { time, frequency });
        pos += hop_size;
    }

    contour
}

/// Extract only the voiced frequencies from a pitch contour.
pub fn voiced_frequencies(contour: &[PitchFrame]) -> Vec<f32> {
    contour.iter().filter_map(|frame| frame.frequency).collect()
}

/// Compute the fraction of frames that are voiced (have a detected pitch).
/// Returns 0.0 if contour is empty.
pub fn voiced_fraction(contour: &[PitchFrame]) -> f32 {
    if contour.is_empty() {
        return 0.0;
    }
    let voiced = contour.iter().filter(|f| f.frequency.is_some()).count();
    voiced as f32 / contour.len() as f32
}

/// Median F0 over voiced frames. 0.0 means no frame had a pitch, which
/// is the "no voice detected" reading rather than an error.
pub fn median_pitch(contour: &[PitchFrame]) -> f32 {
    util::median(&voiced_frequencies(contour)).unwrap_or(0.0)
}
