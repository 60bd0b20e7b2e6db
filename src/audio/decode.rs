use std::path::Path;

use super::{compressed, wav, Waveform};
use crate::error::{HealthError, HealthResult};

/// Container extensions accepted at ingest.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "flac"];

/// Load a recording as a mono waveform at its native sample rate.
///
/// WAV goes through hound, MP3 and FLAC through symphonia. Anything else
/// is refused before the file is opened.
pub fn load_waveform(path: &Path) -> HealthResult<Waveform> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => wav::load_wav(path),
        "mp3" | "flac" => compressed::load_compressed(path, &ext),
        _ => Err(HealthError::Decode(format!(
            "{}: unsupported file type, expected one of {}",
            path.display(),
            ACCEPTED_EXTENSIONS.join(", ")
        ))),
    }
}

/// Turn interleaved decoder output into a mono waveform.
///
/// Non-finite samples are a decode failure: one NaN would poison every
/// frame statistic downstream.
pub(super) fn to_mono(
    path: &Path,
    interleaved: &[f32],
    channels: usize,
    sample_rate: u32,
) -> HealthResult<Waveform> {
    if interleaved.is_empty() {
        return Err(HealthError::EmptyInput);
    }
    if let Some(pos) = interleaved.iter().position(|s| !s.is_finite()) {
        return Err(HealthError::Decode(format!(
            "{}: non-finite sample at index {pos}",
            path.display()
        )));
    }
    Ok(Waveform::new(downmix(interleaved, channels), sample_rate))
}

/// Average interleaved frames down to one channel.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
