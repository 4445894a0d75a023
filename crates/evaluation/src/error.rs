use thiserror::Error;

/// Errors raised by the evaluation pipeline.
///
/// Everything here is contained at the queue worker boundary: a failing
/// stage marks the job failed and the worker keeps polling. `ModelLoad` is
/// the exception — it is raised while building the engine at startup and is
/// fatal, since the process must not accept jobs without a working
/// transcription backend.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The audio container could not be decoded (corrupt or unsupported).
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// Reference text and audio were detected as different languages.
    #[error("language mismatch: reference text is '{text_language}', audio is '{audio_language}'")]
    LanguageMismatch {
        text_language: String,
        audio_language: String,
    },

    /// An ASR model could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Transcription itself failed (inference error, not bad input audio).
    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
