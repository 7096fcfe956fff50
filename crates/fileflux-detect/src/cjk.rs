//! CJK character classification and ratio sampling.

/// Sample size for ratio measurements, in bytes of the leading text.
pub const RATIO_SAMPLE_BYTES: usize = 5 * 1024;

/// Whether a character belongs to a CJK script.
///
/// Covers CJK Unified Ideographs, Extension A, Hangul syllables and jamo,
/// Hiragana and Katakana.
#[inline]
pub fn is_cjk_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code) || // CJK Unified Ideographs
    (0x3400..=0x4DBF).contains(&code) || // CJK Extension A
    (0xAC00..=0xD7AF).contains(&code) || // Hangul Syllables
    (0x1100..=0x11FF).contains(&code) || // Hangul Jamo
    (0x3130..=0x318F).contains(&code) || // Hangul Compatibility Jamo
    (0x3040..=0x309F).contains(&code) || // Hiragana
    (0x30A0..=0x30FF).contains(&code)    // Katakana
}

/// Whether any character of `text` is CJK.
pub fn has_cjk(text: &str) -> bool {
    text.chars().any(is_cjk_char)
}

/// Fraction of non-whitespace, non-control characters that are CJK, over
/// the first [`RATIO_SAMPLE_BYTES`] of `text`.
///
/// Returns 0.0 for empty or all-whitespace input.
pub fn cjk_ratio(text: &str) -> f64 {
    let sample = sample_prefix(text, RATIO_SAMPLE_BYTES);
    let mut total = 0usize;
    let mut cjk = 0usize;
    for c in sample.chars() {
        if c.is_whitespace() || c.is_control() {
            continue;
        }
        total += 1;
        if is_cjk_char(c) {
            cjk += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        cjk as f64 / total as f64
    }
}

/// The longest prefix of `text` at most `max_bytes` long that ends on a
/// character boundary.
pub fn sample_prefix(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cjk_char_ranges() {
        assert!(is_cjk_char('中'));
        assert!(is_cjk_char('한'));
        assert!(is_cjk_char('ㄱ')); // compatibility jamo
        assert!(is_cjk_char('ひ'));
        assert!(is_cjk_char('カ'));
        assert!(!is_cjk_char('a'));
        assert!(!is_cjk_char('1'));
        assert!(!is_cjk_char('ä'));
    }

    #[test]
    fn test_cjk_ratio_pure_scripts() {
        assert_eq!(cjk_ratio("hello world"), 0.0);
        assert!((cjk_ratio("안녕하세요") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cjk_ratio_ignores_whitespace() {
        // Two CJK and two Latin characters, whitespace not counted.
        let r = cjk_ratio("中 文 a b");
        assert!((r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_sample_prefix_respects_char_boundary() {
        let text = "한글".repeat(4000); // 3 bytes per char
        let sample = sample_prefix(&text, RATIO_SAMPLE_BYTES);
        assert!(sample.len() <= RATIO_SAMPLE_BYTES);
        assert!(text.is_char_boundary(sample.len()));
    }

    #[test]
    fn test_empty_ratio() {
        assert_eq!(cjk_ratio(""), 0.0);
        assert_eq!(cjk_ratio("   \n\t"), 0.0);
    }
}
