use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use super::Waveform;
use crate::error::{HealthError, HealthResult};

/// Input frames per resampler call.
const CHUNK_SIZE: usize = 1024;

/// Resample a waveform to `target_rate` Hz.
///
/// A waveform already at the target rate is returned unchanged. Otherwise
/// the whole buffer is pushed through an FFT resampler, the leading delay
/// is dropped and the output is cut to `round(len * target / source)`
/// samples so durations are preserved.
pub fn to_reference_rate(waveform: Waveform, target_rate: u32) -> HealthResult<Waveform> {
    if waveform.sample_rate == target_rate {
        return Ok(waveform);
    }
    if waveform.sample_rate == 0 || target_rate == 0 {
        return Err(HealthError::Decode(format!(
            "cannot resample {} Hz audio to {} Hz",
            waveform.sample_rate, target_rate
        )));
    }

    let mut resampler = FftFixedIn::<f32>::new(
        waveform.sample_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        2,
        1,
    )
    .map_err(resample_err)?;

    let input = &waveform.samples;
    let expected =
        (input.len() as f64 * target_rate as f64 / waveform.sample_rate as f64).round() as usize;
    let delay = resampler.output_delay();

    let mut output: Vec<f32> = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut pos = 0;

    while input.len() - pos >= resampler.input_frames_next() {
        let end = pos + resampler.input_frames_next();
        let chunk = resampler
            .process(&[&input[pos..end]], None)
            .map_err(resample_err)?;
        output.extend_from_slice(&chunk[0]);
        pos = end;
    }

    // Remainder, then flush until the delayed tail is out. rubato rejects
    // an empty channel slice, so flushing passes None for zero padding.
    if pos < input.len() {
        let rest: &[&[f32]] = &[&input[pos..]];
        let tail = resampler
            .process_partial(Some(rest), None)
            .map_err(resample_err)?;
        output.extend_from_slice(&tail[0]);
    }

    while output.len() < delay + expected {
        let flushed = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(resample_err)?;
        if flushed[0].is_empty() {
            break;
        }
        output.extend_from_slice(&flushed[0]);
    }

    let samples: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    debug!(
        from = waveform.sample_rate,
        to = target_rate,
        input = input.len(),
        output = samples.len(),
        "Resampled waveform"
    );

    Ok(Waveform::new(samples, target_rate))
}

fn resample_err(e: impl std::fmt::Display) -> HealthError {
    HealthError::Decode(format!("resampling failed: {e}"))
}
