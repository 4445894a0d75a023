//! Waveform conditioning: resample → peak-normalize → pre-emphasize.

use std::path::Path;

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{
    Async as AsyncResampler, FixedAsync, Resampler as RubatoResampler,
    SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::EvaluationError;
use crate::TARGET_SAMPLE_RATE;

/// Produces the canonical ASR input: mono f32 at 16kHz, peak-normalized to
/// [-1, 1], pre-emphasized with a first-order high-pass
/// (`y[n] = x[n] - coefficient * x[n-1]`) to sharpen phoneme onsets.
pub fn preprocess(
    samples: &[f32],
    sample_rate: u32,
    preemphasis_coefficient: f32,
) -> Result<Vec<f32>, EvaluationError> {
    let mut audio = if sample_rate != TARGET_SAMPLE_RATE {
        resample(samples, sample_rate, TARGET_SAMPLE_RATE)?
    } else {
        samples.to_vec()
    };

    normalize_peak(&mut audio);
    preemphasize(&mut audio, preemphasis_coefficient);
    Ok(audio)
}

/// Scales the waveform so its absolute peak sits at 1.0. Silence is left
/// untouched.
pub fn normalize_peak(audio: &mut [f32]) {
    let peak = audio.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        let gain = 1.0 / peak;
        for s in audio.iter_mut() {
            *s *= gain;
        }
    }
}

/// In-place first-order pre-emphasis. The first sample passes through.
pub fn preemphasize(audio: &mut [f32], coefficient: f32) {
    let mut prev = 0.0f32;
    for s in audio.iter_mut() {
        let current = *s;
        *s = current - coefficient * prev;
        prev = current;
    }
}

/// Resamples mono audio between arbitrary rates using sinc interpolation.
fn resample(audio: &[f32], src_rate: u32, dst_rate: u32) -> Result<Vec<f32>, EvaluationError> {
    let ratio = dst_rate as f64 / src_rate as f64;
    let chunk_size = 1024;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = AsyncResampler::<f32>::new_sinc(
        ratio,
        2.0,
        &params,
        chunk_size,
        1, // mono
        FixedAsync::Input,
    )
    .map_err(|e| EvaluationError::Decode(format!("failed to create resampler: {e}")))?;

    let mut output = Vec::with_capacity((audio.len() as f64 * ratio) as usize + 1024);

    for chunk in audio.chunks(chunk_size) {
        let input = if chunk.len() < chunk_size {
            let mut padded = chunk.to_vec();
            padded.resize(chunk_size, 0.0);
            padded
        } else {
            chunk.to_vec()
        };

        let frames = input.len();
        let input_adapter = InterleavedSlice::new(&input, 1, frames)
            .map_err(|e| EvaluationError::Decode(format!("input adapter error: {e}")))?;

        let result = resampler
            .process(&input_adapter, 0, None)
            .map_err(|e| EvaluationError::Decode(format!("resample error: {e}")))?;

        output.extend(result.take_data());
    }

    // Trim zero-padding artifacts from the final chunk.
    let expected_len = (audio.len() as f64 * ratio) as usize;
    output.truncate(expected_len);

    Ok(output)
}

/// Writes the canonical waveform to disk as 16-bit PCM WAV at 16kHz, so the
/// stored copy of every processed recording has one consistent format.
pub fn write_wav_16k_mono(path: &Path, audio: &[f32]) -> Result<(), EvaluationError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| EvaluationError::Io(std::io::Error::other(e.to_string())))?;
    for &s in audio {
        let clamped = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(clamped)
            .map_err(|e| EvaluationError::Io(std::io::Error::other(e.to_string())))?;
    }
    writer
        .finalize()
        .map_err(|e| EvaluationError::Io(std::io::Error::other(e.to_string())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_peak_bounds() {
        let mut audio = vec![0.1, -0.4, 0.2];
        normalize_peak(&mut audio);
        let peak = audio.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(audio.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_normalize_peak_leaves_silence() {
        let mut audio = vec![0.0f32; 16];
        normalize_peak(&mut audio);
        assert!(audio.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_preemphasis_formula() {
        let mut audio = vec![1.0, 1.0, 1.0, 1.0];
        preemphasize(&mut audio, 0.97);
        assert_eq!(audio[0], 1.0);
        for &s in &audio[1..] {
            assert!((s - 0.03).abs() < 1e-6);
        }
    }

    #[test]
    fn test_preprocess_passthrough_rate_keeps_length() {
        let samples: Vec<f32> = (0..16_000)
            .map(|i| (i as f32 / 50.0).sin() * 0.5)
            .collect();
        let out = preprocess(&samples, TARGET_SAMPLE_RATE, 0.97).unwrap();
        assert_eq!(out.len(), samples.len());
        assert!(out.iter().all(|s| s.abs() <= 1.0 + 1e-3));
    }

    #[test]
    fn test_preprocess_resamples_to_target() {
        let samples: Vec<f32> = (0..48_000)
            .map(|i| (i as f32 / 100.0).sin() * 0.5)
            .collect();
        let out = preprocess(&samples, 48_000, 0.97).unwrap();
        // One second of input in, one second at 16kHz out.
        assert_eq!(out.len(), TARGET_SAMPLE_RATE as usize);
    }

    #[test]
    fn test_wav_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canonical.wav");
        let audio: Vec<f32> = (0..1600).map(|i| (i as f32 / 20.0).sin() * 0.8).collect();

        write_wav_16k_mono(&path, &audio).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(spec.channels, 1);
        assert_eq!(reader.into_samples::<i16>().count(), audio.len());
    }
}
