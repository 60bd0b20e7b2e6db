use rustfft::{num_complex::Complex, FftPlanner};

use super::windowing;

/// Dynamic range kept in the log spectrogram; quieter bins are floored.
const SPECTRUM_RANGE_DB: f32 = 80.0;

/// Envelopes whose strongest onset is below this are treated as flat.
const MIN_ONSET_STRENGTH: f32 = 1e-3;

/// Configuration for onset-based tempo estimation.
#[derive(Debug, Clone)]
pub struct TempoConfig {
    /// STFT size in samples.
    pub fft_size: usize,
    /// Samples between STFT frames.
    pub hop_length: usize,
    /// Slowest tempo considered.
    pub min_bpm: f32,
    /// Fastest tempo considered.
    pub max_bpm: f32,
    /// Centre of the tempo prior.
    pub start_bpm: f32,
    /// Width of the tempo prior, in octaves.
    pub prior_std_octaves: f32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            // 64 ms frames every 16 ms at 16 kHz
            fft_size: 1024,
            hop_length: 256,
            min_bpm: 30.0,
            max_bpm: 300.0,
            start_bpm: 120.0,
            prior_std_octaves: 1.0,
        }
    }
}

/// Onset strength per STFT frame (spectral flux).
///
/// Algorithm:
/// 1. Hann window and FFT each frame
/// 2. Magnitude in dB, floored `SPECTRUM_RANGE_DB` below the loudest bin
/// 3. Onset strength = mean over bins of the positive dB increase since
///    the previous frame
///
/// The first frame has no predecessor, so the envelope has one entry
/// fewer than the spectrogram.
pub fn onset_envelope(samples: &[f32], config: &TempoConfig) -> Vec<f32> {
    let n = config.fft_size;
    if n == 0 || config.hop_length == 0 || samples.len() < n {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let window = windowing::hann(n);
    let bins = n / 2 + 1;

    let mut spectrogram: Vec<Vec<f32>> = Vec::new();
    let mut pos = 0;
    while pos + n <= samples.len() {
        let mut buf: Vec<Complex<f32>> = samples[pos..pos + n]
            .iter()
            .zip(&window)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut buf);

        let frame_db: Vec<f32> = buf[..bins]
            .iter()
            .map(|c| 20.0 * c.norm().max(1e-10).log10())
            .collect();
        spectrogram.push(frame_db);
        pos += config.hop_length;
    }

    let peak_db = spectrogram
        .iter()
        .flatten()
        .fold(f32::NEG_INFINITY, |max, &v| max.max(v));
    let floor_db = peak_db - SPECTRUM_RANGE_DB;

    spectrogram
        .windows(2)
        .map(|pair| {
            let flux: f32 = pair[0]
                .iter()
                .zip(&pair[1])
                .map(|(&prev, &cur)| (cur.max(floor_db) - prev.max(floor_db)).max(0.0))
                .sum();
            flux / bins as f32
        })
        .collect()
}

/// Estimate the tempo of a waveform in beats per minute.
///
/// The onset envelope is mean-centred and autocorrelated over the lags
/// that correspond to [min_bpm, max_bpm]. Each lag's correlation is
/// weighted by a log-normal prior around `start_bpm` so that octave
/// multiples of the true beat do not win. Returns 0.0 when the envelope
/// is flat (silence, steady tones) or too short for the fastest tempo.
pub fn estimate_tempo(samples: &[f32], sample_rate: u32, config: &TempoConfig) -> f32 {
    let envelope = onset_envelope(samples, config);
    let strongest = envelope.iter().fold(0.0_f32, |max, &v| max.max(v));
    if strongest < MIN_ONSET_STRENGTH {
        return 0.0;
    }

    let frames_per_sec = sample_rate as f32 / config.hop_length as f32;
    let lag_to_bpm = |lag: usize| 60.0 * frames_per_sec / lag as f32;

    let min_lag = ((60.0 * frames_per_sec / config.max_bpm).ceil() as usize).max(1);
    let max_lag = ((60.0 * frames_per_sec / config.min_bpm).floor() as usize)
        .min(envelope.len().saturating_sub(1));
    if min_lag > max_lag {
        return 0.0;
    }

    let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
    let centred: Vec<f32> = envelope.iter().map(|&v| v - mean).collect();

    let mut best: Option<(usize, f32)> = None;
    for lag in min_lag..=max_lag {
        let overlap = centred.len() - lag;
        let ac = centred[..overlap]
            .iter()
            .zip(&centred[lag..])
            .map(|(&a, &b)| a * b)
            .sum::<f32>()
            / overlap as f32;
        if ac <= 0.0 {
            continue;
        }

        let octaves = (lag_to_bpm(lag) / config.start_bpm).log2();
        let prior = (-0.5 * (octaves / config.prior_std_octaves).powi(2)).exp();
        let weighted = ac * prior;

        if best.map_or(true, |(_, score)| weighted > score) {
            best = Some((lag, weighted));
        }
    }

    best.map_or(0.0, |(lag, _)| lag_to_bpm(lag))
}
