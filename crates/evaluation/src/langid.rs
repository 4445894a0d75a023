//! Reference-text language identification.
//!
//! The audio language comes from the ASR model; the reference text gets its
//! own detection pass so the two can be cross-checked before scoring.

use whatlang::Lang;

/// Detects the language of `text`, returned as an ISO 639-1 code to match
/// the codes the ASR backends report.
///
/// Returns `None` when the detector has no confident verdict (very short or
/// ambiguous text) or the language has no two-letter code we track; callers
/// skip the language gate in that case rather than failing every short
/// passage.
pub fn detect_text_language(text: &str) -> Option<String> {
    let info = whatlang::detect(text)?;
    if !info.is_reliable() {
        return None;
    }
    iso639_1(info.lang()).map(String::from)
}

/// ISO 639-3 → 639-1 for the languages this service meets in practice:
/// the acoustic-fallback set plus the majors Whisper commonly reports.
fn iso639_1(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Hin => "hi",
        Lang::Tel => "te",
        Lang::Tam => "ta",
        Lang::Kan => "kn",
        Lang::Mal => "ml",
        Lang::Ben => "bn",
        Lang::Guj => "gu",
        Lang::Mar => "mr",
        Lang::Ori => "or",
        Lang::Pan => "pa",
        Lang::Urd => "ur",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Ara => "ar",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Tur => "tr",
        Lang::Vie => "vi",
        Lang::Ind => "id",
        _ => return None,
    };
    Some(code)
}
