use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{AsrBackend, AsrRequest, TranscriptionResult};
use crate::error::EvaluationError;
use crate::TARGET_SAMPLE_RATE;

/// The model's fixed context window: 30 seconds at 16kHz.
const CONTEXT_SAMPLES: usize = 30 * TARGET_SAMPLE_RATE as usize;

/// Get the language string for a whisper language ID.
fn whisper_lang_str(lang_id: i32) -> Option<String> {
    whisper_rs::get_lang_str(lang_id).map(|s| s.to_string())
}

/// General-purpose Whisper backend using whisper.cpp via whisper-rs.
///
/// This is the primary transcription tier: broad language coverage with
/// auto-detection over the full language distribution.
pub struct LocalWhisperBackend {
    ctx: WhisperContext,
}

impl LocalWhisperBackend {
    /// Creates a new Whisper backend, loading the model from disk.
    ///
    /// `model_path` should point to a GGML Whisper model file.
    pub fn new(model_path: &str) -> Result<Self, EvaluationError> {
        info!(model_path, "Loading Whisper model");
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| {
                EvaluationError::ModelLoad(format!(
                    "failed to load Whisper model '{model_path}': {e}"
                ))
            })?;
        info!("Whisper model loaded");
        Ok(Self { ctx })
    }

    /// Tries each model path in priority order (most accurate first) and
    /// returns the first that loads. Erroring out here is fatal: without a
    /// primary backend the service must not accept jobs.
    pub fn load_preferred<P: AsRef<Path>>(model_paths: &[P]) -> Result<Self, EvaluationError> {
        for path in model_paths {
            let path = path.as_ref().display().to_string();
            match Self::new(&path) {
                Ok(backend) => return Ok(backend),
                Err(e) => warn!(model_path = %path, error = %e, "Whisper model unavailable, trying next"),
            }
        }
        Err(EvaluationError::ModelLoad(
            "no Whisper model could be loaded from the configured paths".to_string(),
        ))
    }
}

/// Pads with silence or trims so the waveform exactly fills the context window.
fn pad_or_trim(audio: &[f32]) -> Vec<f32> {
    let mut padded = audio[..audio.len().min(CONTEXT_SAMPLES)].to_vec();
    padded.resize(CONTEXT_SAMPLES, 0.0);
    padded
}

#[async_trait]
impl AsrBackend for LocalWhisperBackend {
    async fn transcribe(
        &self,
        request: AsrRequest,
    ) -> Result<TranscriptionResult, EvaluationError> {
        let audio = pad_or_trim(&request.audio_pcm_16k_mono);
        let hint = request.language_hint;

        // whisper-rs is CPU-bound; run on the blocking thread pool.
        let ctx_ptr = &self.ctx as *const WhisperContext;
        // SAFETY: WhisperContext is Send+Sync, and we create a new state per call
        let ctx_ref = unsafe { &*ctx_ptr };

        let result = tokio::task::spawn_blocking(
            move || -> Result<TranscriptionResult, EvaluationError> {
                let mut state = ctx_ref.create_state().map_err(|e| {
                    EvaluationError::Transcription(format!("failed to create Whisper state: {e}"))
                })?;

                // Detection-only pass: run the encoder over the full language
                // distribution and take the argmax, regardless of any hint.
                let mut detect_params =
                    FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
                detect_params.set_detect_language(true);
                detect_params.set_print_progress(false);
                detect_params.set_print_special(false);
                detect_params.set_print_realtime(false);
                detect_params.set_print_timestamps(false);
                state.full(detect_params, &audio).map_err(|e| {
                    EvaluationError::Transcription(format!("language detection failed: {e}"))
                })?;
                let detected_lang = whisper_lang_str(state.full_lang_id_from_state());

                // Decode pass under the hinted language when one is known,
                // otherwise under the detected one.
                let decode_lang = hint.clone().or_else(|| detected_lang.clone());

                let mut params = FullParams::new(SamplingStrategy::BeamSearch {
                    beam_size: 5,
                    patience: 1.0,
                });
                if let Some(ref lang) = decode_lang {
                    params.set_language(Some(lang.as_str()));
                }

                // Always transcribe in the source language (never translate).
                params.set_translate(false);

                // Suppress non-speech output
                params.set_print_progress(false);
                params.set_print_special(false);
                params.set_print_realtime(false);
                params.set_print_timestamps(false);

                params.set_single_segment(false);
                params.set_no_speech_thold(0.6);
                params.set_suppress_blank(true);

                state.full(params, &audio).map_err(|e| {
                    EvaluationError::Transcription(format!("Whisper transcription failed: {e}"))
                })?;

                let n_segments = state.full_n_segments();

                let mut text = String::new();
                for i in 0..n_segments {
                    if let Some(segment) = state.get_segment(i)
                        && let Ok(seg_text) = segment.to_str()
                    {
                        text.push_str(seg_text);
                    }
                }

                let text = text.trim().to_string();

                debug!(
                    text_len = text.len(),
                    ?detected_lang,
                    ?decode_lang,
                    "Whisper transcription complete"
                );

                Ok(TranscriptionResult {
                    text,
                    language: detected_lang,
                    confidence: None,
                })
            },
        )
        .await
        .map_err(|e| EvaluationError::Transcription(format!("Whisper task join error: {e}")))??;

        Ok(result)
    }

    fn name(&self) -> &str {
        "local_whisper"
    }

    fn supports_language(&self, _lang: &str) -> bool {
        true // Whisper supports 99+ languages
    }
}
