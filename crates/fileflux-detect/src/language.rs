//! Script-based language detection.

use crate::cjk::{cjk_ratio, sample_prefix};

/// Detect the dominant language of `text` by script, single pass.
///
/// Hiragana or Katakana anywhere is a definitive Japanese marker; Hangul is
/// definitive Korean. Ideographs without kana resolve to Chinese. Latin-
/// dominated text resolves to English. Returns `None` when the sample has
/// no letters at all.
pub fn detect_language(text: &str) -> Option<&'static str> {
    let sample = sample_prefix(text, crate::cjk::RATIO_SAMPLE_BYTES);

    let mut has_ideograph = false;
    let mut has_latin = false;

    for c in sample.chars() {
        let code = c as u32;
        if (0x3040..=0x309F).contains(&code) || (0x30A0..=0x30FF).contains(&code) {
            return Some("ja");
        }
        if (0xAC00..=0xD7AF).contains(&code)
            || (0x1100..=0x11FF).contains(&code)
            || (0x3130..=0x318F).contains(&code)
        {
            return Some("ko");
        }
        if !has_ideograph
            && ((0x4E00..=0x9FFF).contains(&code) || (0x3400..=0x4DBF).contains(&code))
        {
            has_ideograph = true;
        }
        if !has_latin && c.is_ascii_alphabetic() {
            has_latin = true;
        }
    }

    if has_ideograph {
        Some("zh")
    } else if has_latin {
        Some("en")
    } else {
        None
    }
}

/// Detect language together with the CJK ratio of the same sample.
pub fn detect_profile(text: &str) -> (Option<&'static str>, f64) {
    (detect_language(text), cjk_ratio(text))
}
