//! Container decoding: any accepted upload format → mono f32 waveform.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::EvaluationError;

/// A decoded waveform: mono samples at the container's native rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Cheap container check used at submission time: returns the detected
/// format name when the leading bytes look like something we can decode.
///
/// Detection is by magic bytes first, extension second — an unrecognized
/// extension still passes if the content sniffs as a known container.
pub fn sniff_container(bytes: &[u8], extension: Option<&str>) -> Option<&'static str> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return Some("wav");
    }
    if bytes.len() >= 4 && &bytes[0..4] == b"OggS" {
        return Some("ogg");
    }
    if bytes.len() >= 3 && &bytes[0..3] == b"ID3" {
        return Some("mp3");
    }
    // Bare MPEG audio frame sync (MP3 without an ID3 tag).
    if bytes.len() >= 2 && bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0 {
        return Some("mp3");
    }
    // EBML header: Matroska/WebM.
    if bytes.len() >= 4 && bytes[0..4] == [0x1A, 0x45, 0xDF, 0xA3] {
        return Some("webm");
    }
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("wav") => Some("wav"),
        Some("mp3") => Some("mp3"),
        Some("ogg") | Some("oga") => Some("ogg"),
        Some("webm") | Some("mkv") => Some("webm"),
        _ => None,
    }
}

/// Decodes an audio file into mono f32 samples at its native sample rate.
///
/// The file extension seeds the format probe as a hint; when the extension
/// is unrecognized, symphonia falls back to sniffing the content, so a
/// mislabeled upload still decodes if any registered reader accepts it.
pub fn decode_audio(path: &Path) -> Result<DecodedAudio, EvaluationError> {
    let file = File::open(path).map_err(|e| {
        EvaluationError::Decode(format!("cannot open '{}': {e}", path.display()))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| {
            EvaluationError::Decode(format!("unrecognized container '{}': {e}", path.display()))
        })?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EvaluationError::Decode("no audio track found".to_string()))?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| EvaluationError::Decode("missing sample rate".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1)
        .max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| EvaluationError::Decode(format!("unsupported codec: {e}")))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(EvaluationError::Decode(format!("packet read failed: {e}")));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let buf = sample_buf.get_or_insert_with(|| {
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
                });
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            // A corrupt packet mid-stream is skipped; a decoder that cannot
            // continue ends the stream.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(_) => break,
        }
    }

    if interleaved.is_empty() {
        return Err(EvaluationError::Decode(format!(
            "no decodable audio in '{}'",
            path.display()
        )));
    }

    let samples = downmix_mono(&interleaved, channels);
    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Averages interleaved frames down to a single channel.
fn downmix_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
