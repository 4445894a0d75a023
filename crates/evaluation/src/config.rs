use serde::{Deserialize, Serialize};

/// Configuration for the reading evaluation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Pre-emphasis filter coefficient applied after normalization.
    pub preemphasis_coefficient: f32,
    /// Initial-WER threshold (percent) above which the per-language acoustic
    /// fallback is attempted. Tunable; 50.0 matches observed behavior.
    pub fallback_wer_threshold: f64,
    /// Languages (ISO 639-1) served by the acoustic fallback tier.
    pub fallback_languages: Vec<String>,
    /// RMS analysis window for pause detection, in milliseconds.
    pub frame_window_ms: u32,
    /// RMS analysis hop for pause detection, in milliseconds.
    pub frame_hop_ms: u32,
    /// A frame is silent when its energy falls below this fraction of the
    /// mean energy across all frames.
    pub silence_energy_ratio: f32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            preemphasis_coefficient: 0.97,
            fallback_wer_threshold: 50.0,
            fallback_languages: [
                "te", "hi", "ta", "kn", "ml", "bn", "gu", "mr", "or", "pa",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            frame_window_ms: 25,
            frame_hop_ms: 10,
            silence_energy_ratio: 0.1,
        }
    }
}

impl EvaluationConfig {
    /// Whether `lang` is eligible for the acoustic fallback tier.
    pub fn is_fallback_language(&self, lang: &str) -> bool {
        self.fallback_languages.iter().any(|l| l == lang)
    }
}
