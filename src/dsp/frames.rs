use serde::{Deserialize, Serialize};

/// Framing used for frame-level RMS.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Samples per frame.
    pub frame_length: usize,
    /// Samples between frame centres.
    pub hop_length: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        // 128 ms frames every 32 ms at 16 kHz
        Self {
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

/// RMS amplitude of each centred frame.
///
/// Frame `i` is centred on sample `i * hop` and spans
/// `[i*hop - frame/2, i*hop + frame/2)`. Samples outside the signal count
/// as zeros, so edge frames read quieter than the interior. There are
/// `1 + len / hop` frames; empty input gives none.
pub fn frame_rms(samples: &[f32], config: &FrameConfig) -> Vec<f32> {
    if samples.is_empty() || config.frame_length == 0 || config.hop_length == 0 {
        return Vec::new();
    }

    let half = config.frame_length / 2;
    let n_frames = 1 + samples.len() / config.hop_length;

    (0..n_frames)
        .map(|i| {
            let center = i * config.hop_length;
            let start = center.saturating_sub(half).min(samples.len());
            let end = (center + config.frame_length - half).min(samples.len());
            let sum_sq: f32 = samples[start..end].iter().map(|&s| s * s).sum();
            (sum_sq / config.frame_length as f32).sqrt()
        })
        .collect()
}

/// Mean frame RMS: a loudness proxy on the same [0, 1] scale as the
/// samples. Returns 0.0 for empty input.
pub fn mean_rms(samples: &[f32], config: &FrameConfig) -> f32 {
    let frames = frame_rms(samples, config);
    if frames.is_empty() {
        return 0.0;
    }
    frames.iter().sum::<f32>() / frames.len() as f32
}
