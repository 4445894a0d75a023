use serde::{Deserialize, Serialize};

/// Final evaluation report for a reading. Immutable once produced; this is
/// the wire shape callers receive when polling a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// The transcription the scores were computed against (post-fallback).
    pub transcription: String,
    /// Language detected from the audio (ISO 639-1).
    pub detected_language: String,
    pub accuracy: AccuracyBlock,
    pub fluency: FluencyBlock,
    pub errors: ErrorBreakdown,
    pub overall_grade: OverallGrade,
    /// Human-readable feedback lines, in fixed order: accuracy, speed, then
    /// error-specific messages.
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyBlock {
    /// Percent in [0, 100], rounded to 2 decimals.
    pub word_error_rate: f64,
    /// Percent in [0, 100], rounded to 2 decimals.
    pub character_error_rate: f64,
    /// `100 - word_error_rate`, floored at 0.
    pub word_accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluencyBlock {
    pub reading_speed_wpm: f64,
    pub pause_count: usize,
    /// Seconds, rounded to 2 decimals.
    pub total_pause_duration: f64,
    /// Seconds, rounded to 2 decimals; 0 when no pauses were detected.
    pub average_pause_duration: f64,
}

/// Word-level error classification from the reference/hypothesis alignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBreakdown {
    /// `(reference_word, hypothesis_word)` pairs.
    pub substitutions: Vec<(String, String)>,
    /// Hypothesis words with no counterpart in the reference.
    pub insertions: Vec<String>,
    /// Reference words the reader skipped.
    pub deletions: Vec<String>,
    /// Reference words read correctly.
    pub correct: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallGrade {
    pub accuracy_grade: char,
    pub speed_grade: char,
    /// Average of the accuracy score and the capped speed contribution,
    /// rounded to 1 decimal.
    pub overall_score: f64,
}

/// Rounds to `decimals` decimal places (report fields carry fixed precision).
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(16.66666, 2), 16.67);
        assert_eq!(round_to(72.25, 1), 72.3);
        assert_eq!(round_to(0.0, 2), 0.0);
    }

    #[test]
    fn report_serializes_substitutions_as_pairs() {
        let report = ErrorBreakdown {
            substitutions: vec![("sat".to_string(), "sit".to_string())],
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["substitutions"][0][0], "sat");
        assert_eq!(json["substitutions"][0][1], "sit");
    }
}
