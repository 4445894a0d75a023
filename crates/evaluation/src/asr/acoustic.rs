//! Language-specific acoustic fallback tier.
//!
//! A narrow CTC acoustic model (wav2vec2-style, exported to ONNX) per
//! regional language. Invoked only when the general-purpose tier's output
//! looks unreliable by its own gross error rate, trading extra latency for
//! accuracy on languages the generalist covers poorly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::Session;
use tracing::{debug, info};

use super::cache::AcousticModelLoader;
use super::{AsrBackend, AsrRequest, TranscriptionResult};
use crate::error::EvaluationError;

/// CTC acoustic model: ONNX session + character vocabulary.
pub struct OnnxAcousticBackend {
    session: Mutex<Session>,
    /// Token id → vocabulary entry ("|" is the word separator).
    id_to_token: Vec<String>,
    blank_id: usize,
    language: String,
    name: String,
}

impl OnnxAcousticBackend {
    /// Loads `model.onnx` + `vocab.json` for one language from `model_dir`.
    ///
    /// `vocab.json` is the usual CTC map of token string → id, with `<pad>`
    /// doubling as the blank token.
    pub fn load(model_dir: &Path, language: &str) -> Result<Self, EvaluationError> {
        let model_path = model_dir.join(language).join("model.onnx");
        let vocab_path = model_dir.join(language).join("vocab.json");

        info!(model = %model_path.display(), language, "Loading acoustic model");

        let session = Session::builder()
            .and_then(|b| b.commit_from_file(&model_path))
            .map_err(|e| {
                EvaluationError::ModelLoad(format!(
                    "failed to load acoustic model '{}': {e}",
                    model_path.display()
                ))
            })?;

        let raw = std::fs::read_to_string(&vocab_path).map_err(|e| {
            EvaluationError::ModelLoad(format!(
                "failed to read vocab '{}': {e}",
                vocab_path.display()
            ))
        })?;
        let vocab: HashMap<String, usize> = serde_json::from_str(&raw).map_err(|e| {
            EvaluationError::ModelLoad(format!(
                "failed to parse vocab '{}': {e}",
                vocab_path.display()
            ))
        })?;

        let size = vocab.values().max().map(|m| m + 1).unwrap_or(0);
        let mut id_to_token = vec![String::new(); size];
        for (token, id) in &vocab {
            id_to_token[*id] = token.clone();
        }
        let blank_id = vocab.get("<pad>").copied().unwrap_or(0);

        Ok(Self {
            session: Mutex::new(session),
            id_to_token,
            blank_id,
            language: language.to_string(),
            name: format!("acoustic_{language}"),
        })
    }

    /// Greedy CTC decode: per-frame argmax, collapse repeats, drop blanks,
    /// word separator → space.
    fn ctc_decode(&self, logits: &[f32], frames: usize, vocab_size: usize) -> String {
        let mut text = String::new();
        let mut prev_id = usize::MAX;

        for frame in 0..frames {
            let row = &logits[frame * vocab_size..(frame + 1) * vocab_size];
            let best = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(id, _)| id)
                .unwrap_or(self.blank_id);

            if best != prev_id && best != self.blank_id {
                match self.id_to_token.get(best).map(String::as_str) {
                    Some("|") => text.push(' '),
                    Some(token) if !token.starts_with('<') => text.push_str(token),
                    _ => {}
                }
            }
            prev_id = best;
        }

        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[async_trait]
impl AsrBackend for OnnxAcousticBackend {
    async fn transcribe(
        &self,
        request: AsrRequest,
    ) -> Result<TranscriptionResult, EvaluationError> {
        let audio = request.audio_pcm_16k_mono;
        let n = audio.len();

        let (frames, vocab_size, logits) = {
            let mut session = self.session.lock().map_err(|_| {
                EvaluationError::Transcription("acoustic session poisoned".to_string())
            })?;

            let input = ort::value::Tensor::from_array(([1usize, n], audio)).map_err(|e| {
                EvaluationError::Transcription(format!("input tensor error: {e}"))
            })?;
            let outputs = session.run(ort::inputs![input]).map_err(|e| {
                EvaluationError::Transcription(format!("acoustic inference failed: {e}"))
            })?;

            let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
                EvaluationError::Transcription(format!("logits extraction failed: {e}"))
            })?;
            // Logits come back as [1, frames, vocab].
            if shape.len() != 3 {
                return Err(EvaluationError::Transcription(format!(
                    "unexpected logits shape {shape:?}"
                )));
            }
            (shape[1] as usize, shape[2] as usize, data.to_vec())
        };

        let text = self.ctc_decode(&logits, frames, vocab_size);
        debug!(
            language = %self.language,
            text_len = text.len(),
            "Acoustic transcription complete"
        );

        Ok(TranscriptionResult {
            text,
            language: Some(self.language.clone()),
            confidence: None,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn supports_language(&self, lang: &str) -> bool {
        lang == self.language
    }
}

/// Loader wiring [`OnnxAcousticBackend`] into the model cache.
pub struct OnnxAcousticLoader {
    model_dir: PathBuf,
}

impl OnnxAcousticLoader {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }
}

impl AcousticModelLoader for OnnxAcousticLoader {
    fn load(&self, language: &str) -> Result<Arc<dyn AsrBackend>, EvaluationError> {
        Ok(Arc::new(OnnxAcousticBackend::load(
            &self.model_dir,
            language,
        )?))
    }
}
