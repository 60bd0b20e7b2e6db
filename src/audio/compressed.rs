use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::{decode, Waveform};
use crate::error::{HealthError, HealthResult};

/// Decode an MP3 or FLAC file with symphonia.
///
/// The first audio track is decoded to interleaved f32 and averaged to
/// mono. A corrupt packet is skipped with a warning; any other error
/// aborts the load.
pub(super) fn load_compressed(path: &Path, ext: &str) -> HealthResult<Waveform> {
    let decode_err = |e: SymphoniaError| HealthError::Decode(format!("{}: {e}", path.display()));

    let file =
        File::open(path).map_err(|e| HealthError::Decode(format!("{}: {e}", path.display())))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(ext);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_err)?;
    let mut format = probed.format;

    let (track_id, params) = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| HealthError::Decode(format!("{}: no audio track", path.display())))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(decode_err)?;

    let mut sample_rate = params.sample_rate;
    let mut channels = params.channels.map(|c| c.count()).unwrap_or(1);
    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_err(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!(path = %path.display(), error = msg, "Skipping corrupt packet");
                continue;
            }
            Err(e) => return Err(decode_err(e)),
        };

        let spec = *decoded.spec();
        sample_rate = Some(spec.rate);
        channels = spec.channels.count();

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buf.samples());
    }

    let sample_rate = sample_rate
        .ok_or_else(|| HealthError::Decode(format!("{}: unknown sample rate", path.display())))?;
    let wave = decode::to_mono(path, &interleaved, channels, sample_rate)?;
    debug!(
        path = %path.display(),
        sample_rate,
        channels,
        samples = wave.samples.len(),
        "Decoded {ext}"
    );

    Ok(wave)
}

#[cfg(test)]
mod tests {
    use crate::audio::decode::load_waveform;
    use crate::error::HealthError;
    use std::f32::consts::PI;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(name)
    }

    #[test]
    fn flac_decodes_losslessly() {
        // 1 s of a 200 Hz sine at half scale, 16-bit mono at 16 kHz
        let wave = load_waveform(&fixture("sine_200hz_16k.flac")).unwrap();
        assert_eq!(wave.sample_rate, 16_000);
        assert_eq!(wave.samples.len(), 16_000);

        for (i, &s) in wave.samples.iter().enumerate().step_by(97) {
            let expected = 0.5 * (2.0 * PI * 200.0 * i as f32 / 16_000.0).sin();
            assert!(
                (s - expected).abs() < 1e-3,
                "sample {i}: expected {expected}, got {s}"
            );
        }
    }

    #[test]
    fn mp3_decodes_to_mono() {
        // 45 MPEG-2 layer III frames of 576 samples at 22.05 kHz
        let wave = load_waveform(&fixture("short_mono.mp3")).unwrap();
        assert_eq!(wave.sample_rate, 22_050);
        assert!(
            (20_000..=27_000).contains(&wave.samples.len()),
            "got {} samples",
            wave.samples.len()
        );
        assert!(wave.samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn flac_runs_through_the_pipeline() {
        let monitor = crate::analysis::monitor::HealthMonitor::default();
        let wave = load_waveform(&fixture("sine_200hz_16k.flac")).unwrap();
        let result = monitor.analyze("p", &wave).unwrap();
        assert!((result.metrics.pitch.value - 200.0).abs() < 5.0);
    }

    #[test]
    fn garbage_mp3_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        assert!(matches!(
            load_waveform(&path),
            Err(HealthError::Decode(_) | HealthError::EmptyInput)
        ));
    }

    #[test]
    fn uppercase_extension_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLIP.FLAC");
        std::fs::copy(fixture("sine_200hz_16k.flac"), &path).unwrap();
        assert_eq!(load_waveform(&path).unwrap().sample_rate, 16_000);
    }
}
