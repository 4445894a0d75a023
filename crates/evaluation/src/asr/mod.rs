#[cfg(feature = "local-whisper")]
pub mod whisper;

#[cfg(feature = "acoustic-onnx")]
pub mod acoustic;

pub mod cache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// Request to transcribe a preprocessed recording.
pub struct AsrRequest {
    /// PCM audio at 16kHz mono, f32 normalized [-1.0, 1.0].
    pub audio_pcm_16k_mono: Vec<f32>,
    /// Optional decoding hint (ISO 639-1). Detection still runs over the
    /// full language distribution; the hint only forces the decode language.
    pub language_hint: Option<String>,
    /// Sample rate (always 16000 for this pipeline).
    pub sample_rate: u32,
}

/// Result of an ASR transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    /// Language the model detected in the audio, independent of any hint.
    pub language: Option<String>,
    pub confidence: Option<f64>,
}

/// Trait for pluggable ASR backends.
#[async_trait]
pub trait AsrBackend: Send + Sync + 'static {
    /// Transcribes a complete recording.
    async fn transcribe(&self, request: AsrRequest) -> Result<TranscriptionResult, EvaluationError>;

    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Whether this backend supports a given language code.
    fn supports_language(&self, lang: &str) -> bool;
}
