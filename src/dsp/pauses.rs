use super::frames::{self, FrameConfig};

/// Split a waveform into non-silent intervals.
///
/// A frame is non-silent when its RMS is within `top_db` of the loudest
/// frame. Consecutive non-silent frames form one interval, returned as a
/// sample range `[start, end)`. A waveform with no energy at all has no
/// intervals.
pub fn non_silent_intervals(
    samples: &[f32],
    config: &FrameConfig,
    top_db: f32,
) -> Vec<(usize, usize)> {
    let rms = frames::frame_rms(samples, config);
    let peak = rms.iter().fold(0.0_f32, |max, &v| max.max(v));
    if peak == 0.0 {
        return Vec::new();
    }

    let loud: Vec<bool> = rms
        .iter()
        .map(|&v| v > 0.0 && 20.0 * (v / peak).log10() > -top_db)
        .collect();

    let to_interval = |first: usize, last: usize| {
        (
            first * config.hop_length,
            ((last + 1) * config.hop_length).min(samples.len()),
        )
    };

    let mut intervals = Vec::new();
    let mut start = None;
    for (i, &is_loud) in loud.iter().enumerate() {
        match (is_loud, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                intervals.push(to_interval(s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    // A run that extends to the end of the waveform
    if let Some(s) = start {
        intervals.push(to_interval(s, loud.len() - 1));
    }

    intervals
}

/// Pause lengths in seconds: the positive gaps between consecutive
/// non-silent intervals. Silence before the first interval or after the
/// last one is not a pause.
pub fn pause_lengths(intervals: &[(usize, usize)], sample_rate: u32) -> Vec<f32> {
    intervals
        .windows(2)
        .filter_map(|pair| {
            let (_, prev_end) = pair[0];
            let (next_start, _) = pair[1];
            (next_start > prev_end).then(|| (next_start - prev_end) as f32 / sample_rate as f32)
        })
        .collect()
}

/// Mean pause length in seconds, or 0.0 when there is no pause
/// (no sound, or one continuous stretch of sound).
pub fn mean_pause_secs(samples: &[f32], sample_rate: u32, config: &FrameConfig, top_db: f32) -> f32 {
    let intervals = non_silent_intervals(samples, config, top_db);
    let pauses = pause_lengths(&intervals, sample_rate);
    if pauses.is_empty() {
        return 0.0;
    }
    pauses.iter().sum::<f32>() / pauses.len() as f32
}
