use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use super::{decode, Waveform};
use crate::error::{HealthError, HealthResult};

/// Decode a WAV file with hound, scaling integer PCM to [-1.0, 1.0].
pub(super) fn load_wav(path: &Path) -> HealthResult<Waveform> {
    let decode_err = |e: hound::Error| HealthError::Decode(format!("{}: {e}", path.display()));

    let mut reader = WavReader::open(path).map_err(decode_err)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<hound::Result<Vec<_>>>()
                .map_err(decode_err)?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<hound::Result<Vec<_>>>()
            .map_err(decode_err)?,
    };

    let wave = decode::to_mono(path, &interleaved, spec.channels as usize, spec.sample_rate)?;
    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        samples = wave.samples.len(),
        "Decoded WAV"
    );

    Ok(wave)
}
