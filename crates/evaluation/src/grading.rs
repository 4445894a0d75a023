//! Threshold-table grading and feedback generation.

use std::collections::HashMap;

use crate::report::{round_to, ErrorBreakdown, OverallGrade};

/// Letter grade for reading speed in words per minute.
pub fn speed_grade(wpm: f64) -> char {
    if wpm >= 180.0 {
        'A'
    } else if wpm >= 120.0 {
        'B'
    } else if wpm >= 60.0 {
        'C'
    } else {
        'D'
    }
}

/// Letter grade for the accuracy score (`100 - WER`, floored at 0).
pub fn accuracy_grade(accuracy_score: f64) -> char {
    if accuracy_score >= 95.0 {
        'A'
    } else if accuracy_score >= 85.0 {
        'B'
    } else if accuracy_score >= 75.0 {
        'C'
    } else {
        'D'
    }
}

/// Combined grade. The speed contribution is capped at 50 so a fast but
/// inaccurate reading cannot dominate the overall score.
pub fn overall_grade(wer: f64, reading_speed_wpm: f64) -> OverallGrade {
    let accuracy_score = (100.0 - wer).max(0.0);
    OverallGrade {
        accuracy_grade: accuracy_grade(accuracy_score),
        speed_grade: speed_grade(reading_speed_wpm),
        overall_score: round_to(
            (accuracy_score + (reading_speed_wpm / 2.0).min(50.0)) / 2.0,
            1,
        ),
    }
}

/// Builds feedback lines in fixed order: accuracy tier, speed tier, then
/// error-specific messages (top mispronunciations, omissions, additions).
pub fn generate_feedback(
    word_accuracy: f64,
    reading_speed_wpm: f64,
    errors: &ErrorBreakdown,
) -> Vec<String> {
    let mut feedback = Vec::new();

    feedback.push(
        if word_accuracy >= 95.0 {
            "Excellent accuracy! You read almost perfectly."
        } else if word_accuracy >= 85.0 {
            "Good accuracy! Minor improvements needed."
        } else if word_accuracy >= 75.0 {
            "Fair accuracy. Practice more for better results."
        } else {
            "Keep practicing! Focus on word pronunciation."
        }
        .to_string(),
    );

    feedback.push(
        if reading_speed_wpm >= 180.0 {
            "Excellent reading speed!"
        } else if reading_speed_wpm >= 120.0 {
            "Good reading speed."
        } else if reading_speed_wpm >= 60.0 {
            "Reading speed needs improvement."
        } else {
            "Practice reading faster while maintaining accuracy."
        }
        .to_string(),
    );

    if !errors.substitutions.is_empty() {
        let common = most_common_substitutions(&errors.substitutions, 3);
        feedback.push(format!(
            "Commonly mispronounced words: {}",
            common.join(", ")
        ));
    }
    if !errors.deletions.is_empty() {
        feedback.push(format!(
            "You skipped {} words. Read more carefully.",
            errors.deletions.len()
        ));
    }
    if !errors.insertions.is_empty() {
        feedback.push(format!(
            "You added {} extra words. Stick to the text.",
            errors.insertions.len()
        ));
    }

    feedback
}

/// The up-to-`limit` most frequently substituted reference words, most
/// frequent first; first-seen order breaks ties deterministically.
fn most_common_substitutions(substitutions: &[(String, String)], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for (reference_word, _) in substitutions {
        let word = reference_word.as_str();
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.into_iter().take(limit).map(String::from).collect()
}
