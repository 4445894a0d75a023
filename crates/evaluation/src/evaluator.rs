//! End-to-end evaluation of one recorded reading against its reference text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::align;
use crate::asr::cache::AcousticModelCache;
use crate::asr::{AsrBackend, AsrRequest};
use crate::audio;
use crate::config::EvaluationConfig;
use crate::error::EvaluationError;
use crate::fluency;
use crate::grading;
use crate::langid;
use crate::report::{round_to, AccuracyBlock, EvaluationReport, FluencyBlock};
use crate::TARGET_SAMPLE_RATE;

/// Where the canonical 16kHz WAV for a processed upload lives: the original
/// path with a `.wav` extension (an upload that already was WAV is
/// overwritten in place with the normalized waveform).
pub fn canonical_wav_path(audio_path: &Path) -> PathBuf {
    audio_path.with_extension("wav")
}

/// Two-tier reading evaluator.
///
/// Holds the primary general-purpose backend and the per-language acoustic
/// cache for the process lifetime; decoding does not mutate model state, so
/// one instance serves every job the worker claims.
pub struct ReadingEvaluator {
    primary: Arc<dyn AsrBackend>,
    acoustic: AcousticModelCache,
    config: EvaluationConfig,
}

impl ReadingEvaluator {
    pub fn new(
        primary: Arc<dyn AsrBackend>,
        acoustic: AcousticModelCache,
        config: EvaluationConfig,
    ) -> Self {
        Self {
            primary,
            acoustic,
            config,
        }
    }

    /// Runs the full pipeline: decode → preprocess → transcribe (with
    /// conditional tier escalation) → score → grade.
    ///
    /// Aborts with [`EvaluationError::LanguageMismatch`] when the reference
    /// text and the audio are detected as different languages — scoring a
    /// transcript against text in another language would only produce a
    /// meaningless low score.
    pub async fn evaluate(
        &self,
        audio_path: &Path,
        reference_text: &str,
    ) -> Result<EvaluationReport, EvaluationError> {
        let text_language = langid::detect_text_language(reference_text);
        debug!(?text_language, "Reference text language detected");

        let decoded = audio::decode_audio(audio_path)?;
        let samples = audio::preprocess(
            &decoded.samples,
            decoded.sample_rate,
            self.config.preemphasis_coefficient,
        )?;

        // Persist the canonical waveform so every stored recording shares
        // one on-disk format; downstream stages keep using the buffer.
        audio::write_wav_16k_mono(&canonical_wav_path(audio_path), &samples)?;

        let primary_result = self
            .primary
            .transcribe(AsrRequest {
                audio_pcm_16k_mono: samples.clone(),
                language_hint: text_language.clone(),
                sample_rate: TARGET_SAMPLE_RATE,
            })
            .await?;

        let audio_language = primary_result
            .language
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        // Hard validation gate, not a warning. Skipped only when the text
        // detector had no verdict (very short passages).
        if let Some(ref text_lang) = text_language
            && *text_lang != audio_language
        {
            return Err(EvaluationError::LanguageMismatch {
                text_language: text_lang.clone(),
                audio_language,
            });
        }

        let mut transcription = primary_result.text;

        // Tier escalation: when the generalist's own gross error rate says
        // its output is unreliable and a narrow acoustic model exists for
        // the language, re-transcribe and replace.
        let initial_wer = align::word_error_rate(reference_text, &transcription);
        let fallback_language = text_language.as_deref().unwrap_or(&audio_language);
        if initial_wer > self.config.fallback_wer_threshold
            && self.config.is_fallback_language(fallback_language)
        {
            info!(
                initial_wer,
                language = fallback_language,
                "Primary transcription unreliable, escalating to acoustic model"
            );
            let acoustic = self.acoustic.get_or_load(fallback_language)?;
            let fallback_result = acoustic
                .transcribe(AsrRequest {
                    audio_pcm_16k_mono: samples.clone(),
                    language_hint: Some(fallback_language.to_string()),
                    sample_rate: TARGET_SAMPLE_RATE,
                })
                .await?;
            transcription = fallback_result.text;
        }

        Ok(self.score(reference_text, &transcription, &audio_language, &samples))
    }

    /// Pure scoring stage: accuracy, fluency, error breakdown, grade, feedback.
    fn score(
        &self,
        reference_text: &str,
        transcription: &str,
        audio_language: &str,
        samples: &[f32],
    ) -> EvaluationReport {
        let wer = align::word_error_rate(reference_text, transcription);
        let cer = align::character_error_rate(reference_text, transcription);
        let word_accuracy = (100.0 - round_to(wer, 2)).max(0.0);

        let word_count = reference_text.split_whitespace().count();
        let reading_speed = fluency::reading_speed_wpm(word_count, samples, TARGET_SAMPLE_RATE);
        let pauses = fluency::analyze_pauses(samples, TARGET_SAMPLE_RATE, &self.config);

        let errors = align::classify_errors(reference_text, transcription);
        let overall_grade = grading::overall_grade(wer, reading_speed);
        let feedback = grading::generate_feedback(word_accuracy, reading_speed, &errors);

        EvaluationReport {
            transcription: transcription.to_string(),
            detected_language: audio_language.to_string(),
            accuracy: AccuracyBlock {
                word_error_rate: round_to(wer, 2),
                character_error_rate: round_to(cer, 2),
                word_accuracy,
            },
            fluency: FluencyBlock {
                reading_speed_wpm: round_to(reading_speed, 2),
                pause_count: pauses.pause_count,
                total_pause_duration: round_to(pauses.total_pause_duration, 2),
                average_pause_duration: round_to(pauses.average_pause_duration, 2),
            },
            errors,
            overall_grade,
            feedback,
        }
    }
}
