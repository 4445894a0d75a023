//! Reference/hypothesis alignment and error-rate scoring.

use crate::report::ErrorBreakdown;

/// Normalize text for comparison: lowercase, strip punctuation, collapse
/// whitespace. Applied identically to reference and hypothesis so the rates
/// reflect content, not formatting. Idempotent.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split normalized text into words.
pub fn normalize_words(text: &str) -> Vec<String> {
    normalize_text(text)
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// Levenshtein edit distance over arbitrary token sequences.
pub fn levenshtein<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> usize {
    let m = reference.len();
    let n = hypothesis.len();
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if reference[i - 1] == hypothesis[j - 1] {
                0
            } else {
                1
            };
            curr[j] = std::cmp::min(
                std::cmp::min(prev[j] + 1, curr[j - 1] + 1),
                prev[j - 1] + cost,
            );
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// Word Error Rate as a percentage clamped to [0, 100].
///
/// An empty reference yields 0 (nothing to misread), guarding the division.
pub fn word_error_rate(reference: &str, hypothesis: &str) -> f64 {
    let ref_words = normalize_words(reference);
    let hyp_words = normalize_words(hypothesis);

    if ref_words.is_empty() {
        return 0.0;
    }

    let distance = levenshtein(&ref_words, &hyp_words);
    let wer = distance as f64 / ref_words.len() as f64 * 100.0;
    wer.clamp(0.0, 100.0)
}

/// Character Error Rate over the full normalized strings (not per-word),
/// as a percentage clamped to [0, 100]. Empty reference yields 0.
pub fn character_error_rate(reference: &str, hypothesis: &str) -> f64 {
    let ref_chars: Vec<char> = normalize_text(reference).chars().collect();
    let hyp_chars: Vec<char> = normalize_text(hypothesis).chars().collect();

    if ref_chars.is_empty() {
        return 0.0;
    }

    let distance = levenshtein(&ref_chars, &hyp_chars);
    let cer = distance as f64 / ref_chars.len() as f64 * 100.0;
    cer.clamp(0.0, 100.0)
}

/// One span of an opcode alignment between two word sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// Classifies word-level errors via an edit-distance opcode alignment.
///
/// Every reference word lands in exactly one of `correct`, `substitutions`
/// or `deletions`, and every hypothesis word in `correct`, `substitutions`
/// or `insertions`.
pub fn classify_errors(reference: &str, hypothesis: &str) -> ErrorBreakdown {
    let ref_words = normalize_words(reference);
    let hyp_words = normalize_words(hypothesis);
    let mut errors = ErrorBreakdown::default();

    for (tag, i1, i2, j1, j2) in opcodes(&ref_words, &hyp_words) {
        match tag {
            OpTag::Equal => errors.correct.extend(ref_words[i1..i2].iter().cloned()),
            OpTag::Replace => {
                // Zip pairwise over the shorter of the two spans; the DP
                // backtrace only emits equal-length replace spans, so this
                // is total in practice.
                errors.substitutions.extend(
                    ref_words[i1..i2]
                        .iter()
                        .zip(hyp_words[j1..j2].iter())
                        .map(|(r, h)| (r.clone(), h.clone())),
                );
            }
            OpTag::Delete => errors.deletions.extend(ref_words[i1..i2].iter().cloned()),
            OpTag::Insert => errors.insertions.extend(hyp_words[j1..j2].iter().cloned()),
        }
    }

    errors
}

/// Grouped opcodes `(tag, ref_start, ref_end, hyp_start, hyp_end)` from a
/// full edit-distance backtrace, matches preferred over edits.
fn opcodes(
    ref_words: &[String],
    hyp_words: &[String],
) -> Vec<(OpTag, usize, usize, usize, usize)> {
    let m = ref_words.len();
    let n = hyp_words.len();

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            let cost = if ref_words[i - 1] == hyp_words[j - 1] {
                0
            } else {
                1
            };
            dp[i][j] = std::cmp::min(
                std::cmp::min(dp[i - 1][j] + 1, dp[i][j - 1] + 1),
                dp[i - 1][j - 1] + cost,
            );
        }
    }

    // Backtrace from (m, n), collecting single-token ops in reverse.
    let mut ops: Vec<OpTag> = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && ref_words[i - 1] == hyp_words[j - 1] {
            ops.push(OpTag::Equal);
            i -= 1;
            j -= 1;
        } else if i > 0 && j > 0 && dp[i][j] == dp[i - 1][j - 1] + 1 {
            ops.push(OpTag::Replace);
            i -= 1;
            j -= 1;
        } else if i > 0 && dp[i][j] == dp[i - 1][j] + 1 {
            ops.push(OpTag::Delete);
            i -= 1;
        } else {
            ops.push(OpTag::Insert);
            j -= 1;
        }
    }
    ops.reverse();

    // Group runs of the same tag into spans.
    let mut grouped = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    let mut idx = 0;
    while idx < ops.len() {
        let tag = ops[idx];
        let (start_i, start_j) = (i, j);
        while idx < ops.len() && ops[idx] == tag {
            match tag {
                OpTag::Equal | OpTag::Replace => {
                    i += 1;
                    j += 1;
                }
                OpTag::Delete => i += 1,
                OpTag::Insert => j += 1,
            }
            idx += 1;
        }
        grouped.push((tag, start_i, i, start_j, j));
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wer_identical() {
        assert_eq!(word_error_rate("hello world", "hello world"), 0.0);
    }

    #[test]
    fn test_wer_one_substitution() {
        assert!((word_error_rate("hello world", "hello earth") - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_wer_case_and_punctuation_insensitive() {
        assert_eq!(word_error_rate("Hello, World!", "hello world"), 0.0);
    }

    #[test]
    fn test_wer_empty_reference_is_zero() {
        assert_eq!(word_error_rate("", ""), 0.0);
        assert_eq!(word_error_rate("", "some extra text"), 0.0);
    }

    #[test]
    fn test_wer_clamped_to_100() {
        // 1 reference word, many hypothesis words: raw rate would exceed 100%.
        let wer = word_error_rate("one", "a b c d e f");
        assert_eq!(wer, 100.0);
    }

    #[test]
    fn test_cer_bounds_and_zero() {
        assert_eq!(character_error_rate("reading", "reading"), 0.0);
        assert_eq!(character_error_rate("", "anything"), 0.0);
        let cer = character_error_rate("ab", "xyzxyzxyz");
        assert_eq!(cer, 100.0);
    }

    #[test]
    fn test_cat_sat_mat_scenario() {
        let reference = "The cat sat on the mat";
        let hypothesis = "The cat sit on the mat";

        let wer = word_error_rate(reference, hypothesis);
        assert!((wer - 100.0 / 6.0).abs() < 0.01);

        let errors = classify_errors(reference, hypothesis);
        assert_eq!(
            errors.substitutions,
            vec![("sat".to_string(), "sit".to_string())]
        );
        assert!(errors.insertions.is_empty());
        assert!(errors.deletions.is_empty());
        assert_eq!(errors.correct.len(), 5);
    }

    #[test]
    fn test_alignment_length_invariants() {
        let cases = [
            ("the quick brown fox", "the quik brown fox jumps"),
            ("a b c d e", "x y"),
            ("", "completely new words"),
            ("all gone", ""),
            ("same same same", "same same same"),
        ];
        for (reference, hypothesis) in cases {
            let ref_len = normalize_words(reference).len();
            let hyp_len = normalize_words(hypothesis).len();
            let e = classify_errors(reference, hypothesis);
            assert_eq!(
                e.correct.len() + e.substitutions.len() + e.deletions.len(),
                ref_len,
                "reference invariant for {reference:?} vs {hypothesis:?}"
            );
            assert_eq!(
                e.correct.len() + e.substitutions.len() + e.insertions.len(),
                hyp_len,
                "hypothesis invariant for {reference:?} vs {hypothesis:?}"
            );
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize_text("Hello, World!  How  Are You?");
        assert_eq!(once, "hello world how are you");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_normalize_keeps_non_ascii_letters() {
        assert_eq!(normalize_text("Österreich: 25°C!"), "österreich 25c");
    }

    #[test]
    fn test_classify_pure_deletion_and_insertion() {
        let e = classify_errors("one two three", "one three");
        assert_eq!(e.deletions, vec!["two".to_string()]);
        assert!(e.substitutions.is_empty());

        let e = classify_errors("one three", "one two three");
        assert_eq!(e.insertions, vec!["two".to_string()]);
        assert!(e.substitutions.is_empty());
    }
}
